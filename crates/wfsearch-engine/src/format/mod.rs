// Text format adapters.
//
// Parsers take file contents as `&str` and return the model together with
// the problems they recovered from. A bad line is skipped and reported; it
// never aborts the parse.

pub mod carmel;
pub mod hmm_file;
pub mod lexicon;
pub mod output;

use std::fmt;

pub use carmel::{ParsedPfst, parse_pfst, write_pfst};
pub use hmm_file::{ParsedHmm, SectionCounts, parse_hmm};
pub use lexicon::{Expansion, LexiconEntry, Morphotactics, expand, parse_lexicon, parse_morphotactics};

/// Section of an HMM parameter file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Init,
    Transition,
    Emission,
}

impl Section {
    /// The marker line that opens the section, if any.
    pub fn marker(self) -> Option<&'static str> {
        match self {
            Section::Header => None,
            Section::Init => Some("\\init"),
            Section::Transition => Some("\\transition"),
            Section::Emission => Some("\\emission"),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.marker() {
            Some(marker) => f.write_str(marker),
            None => f.write_str("header"),
        }
    }
}

/// What was wrong with a skipped (or replaced) line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiagnosticKind {
    #[error("{section} line needs at least {expected} fields, found {found}")]
    FieldCount {
        section: Section,
        expected: usize,
        found: usize,
    },
    #[error("cannot parse probability `{0}`")]
    BadProbability(String),
    #[error("probability {0} is outside [0, 1]")]
    OutOfRange(f64),
    #[error("header line is not `key=value`: {0}")]
    MalformedHeader(String),
    #[error("malformed rule: {0}")]
    MalformedRule(String),
    #[error("replaces an earlier definition of the same entry")]
    Duplicate,
    #[error("lexicon line needs exactly `word class`, found {0} fields")]
    MalformedLexicon(usize),
    #[error("class `{0}` does not appear in the morphotactic rules")]
    UnknownClass(String),
}

/// A recovered problem, tied to its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind) -> Self {
        Self { line, kind }
    }

    /// Whether the line was dropped (as opposed to accepted with a note).
    pub fn skipped_line(&self) -> bool {
        !matches!(
            self.kind,
            DiagnosticKind::Duplicate | DiagnosticKind::UnknownClass(_)
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// Parse a probability column, checking its range.
pub(crate) fn parse_prob(token: &str) -> Result<f64, DiagnosticKind> {
    let p: f64 = token
        .parse()
        .map_err(|_| DiagnosticKind::BadProbability(token.to_owned()))?;
    if wfsearch_core::logprob::is_probability(p) {
        Ok(p)
    } else {
        Err(DiagnosticKind::OutOfRange(p))
    }
}

/// Trimmed non-blank lines with 1-based line numbers.
pub(crate) fn nonblank_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

/// Non-blank lines that are not `#` comments, with 1-based line numbers.
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    nonblank_lines(text).filter(|(_, l)| !l.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_column() {
        assert_eq!(parse_prob("0.25"), Ok(0.25));
        assert_eq!(parse_prob("1"), Ok(1.0));
        assert_eq!(parse_prob("1.5"), Err(DiagnosticKind::OutOfRange(1.5)));
        assert_eq!(
            parse_prob("abc"),
            Err(DiagnosticKind::BadProbability("abc".into()))
        );
    }

    #[test]
    fn diagnostics_render_with_line_numbers() {
        let d = Diagnostic::new(7, DiagnosticKind::OutOfRange(2.0));
        assert_eq!(d.to_string(), "line 7: probability 2 is outside [0, 1]");
        assert!(d.skipped_line());
        assert!(!Diagnostic::new(1, DiagnosticKind::Duplicate).skipped_line());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let lines: Vec<_> = content_lines("# c\n\n a \n#x\nb").collect();
        assert_eq!(lines, vec![(3, "a"), (5, "b")]);
    }

    #[test]
    fn nonblank_lines_keep_hash_lines() {
        let lines: Vec<_> = nonblank_lines("# c\n\n a \n").collect();
        assert_eq!(lines, vec![(1, "# c"), (3, "a")]);
    }
}
