// HMM parameter files.
//
//   state_num=3
//   sym_num=4
//   ...
//   \init
//   BOS 1.0
//   \transition
//   BOS N 0.7 -0.154
//   \emission
//   N they 0.4

use hashbrown::HashSet;

use super::{Diagnostic, DiagnosticKind, Section, nonblank_lines, parse_prob};
use crate::hmm::{Hmm, HmmBuilder};

/// Line and entity counts actually found in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCounts {
    /// Distinct states in the init and transition sections.
    pub states: usize,
    /// Distinct emitted symbols.
    pub symbols: usize,
    pub init_lines: usize,
    pub trans_lines: usize,
    pub emiss_lines: usize,
}

/// A parsed HMM plus the header it claimed and what was skipped.
#[derive(Debug, Clone)]
pub struct ParsedHmm {
    pub hmm: Hmm,
    /// Header entries in file order, values kept as written.
    pub header: Vec<(String, String)>,
    pub counts: SectionCounts,
    pub diagnostics: Vec<(Section, Diagnostic)>,
}

impl ParsedHmm {
    /// Claimed value of a header field, if present.
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Lines dropped from one section.
    pub fn skipped_lines(&self, section: Section) -> usize {
        self.diagnostics
            .iter()
            .filter(|(s, d)| *s == section && d.skipped_line())
            .count()
    }
}

fn section_of(line: &str) -> Option<Section> {
    [Section::Init, Section::Transition, Section::Emission]
        .into_iter()
        .find(|s| s.marker() == Some(line))
}

/// Parse an HMM file. Never fails: an empty file yields an empty model.
pub fn parse_hmm(text: &str) -> ParsedHmm {
    let mut builder = HmmBuilder::new();
    let mut header = Vec::new();
    let mut counts = SectionCounts::default();
    let mut diagnostics = Vec::new();
    let mut states: HashSet<String> = HashSet::new();
    let mut symbols: HashSet<String> = HashSet::new();
    let mut section = Section::Header;

    for (line_no, line) in nonblank_lines(text) {
        if let Some(next) = section_of(line) {
            section = next;
            continue;
        }
        // Ok(true) when the line replaced an earlier entry.
        let result = match section {
            Section::Header => header_line(line).map(|kv| {
                header.push(kv);
                false
            }),
            Section::Init => fields(line, section, 2).and_then(|f| {
                let replaced = builder.add_initial(f[0], parse_prob(f[1])?).map_err(to_kind)?;
                states.insert(f[0].to_owned());
                counts.init_lines += 1;
                Ok(replaced)
            }),
            Section::Transition => fields(line, section, 3).and_then(|f| {
                let replaced = builder
                    .add_transition(f[0], f[1], parse_prob(f[2])?)
                    .map_err(to_kind)?;
                states.insert(f[0].to_owned());
                states.insert(f[1].to_owned());
                counts.trans_lines += 1;
                Ok(replaced)
            }),
            Section::Emission => fields(line, section, 3).and_then(|f| {
                let replaced = builder
                    .add_emission(f[0], f[1], parse_prob(f[2])?)
                    .map_err(to_kind)?;
                symbols.insert(f[1].to_owned());
                counts.emiss_lines += 1;
                Ok(replaced)
            }),
        };
        match result {
            Ok(false) => {}
            Ok(true) => diagnostics.push((section, Diagnostic::new(line_no, DiagnosticKind::Duplicate))),
            Err(kind) => diagnostics.push((section, Diagnostic::new(line_no, kind))),
        }
    }

    counts.states = states.len();
    counts.symbols = symbols.len();
    ParsedHmm {
        hmm: builder.build(),
        header,
        counts,
        diagnostics,
    }
}

fn header_line(line: &str) -> Result<(String, String), DiagnosticKind> {
    match line.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        _ => Err(DiagnosticKind::MalformedHeader(line.to_owned())),
    }
}

fn fields(line: &str, section: Section, expected: usize) -> Result<Vec<&str>, DiagnosticKind> {
    let f: Vec<&str> = line.split_whitespace().collect();
    if f.len() < expected {
        return Err(DiagnosticKind::FieldCount {
            section,
            expected,
            found: f.len(),
        });
    }
    Ok(f)
}

fn to_kind(err: crate::ModelError) -> DiagnosticKind {
    match err {
        crate::ModelError::ProbabilityOutOfRange(p) => DiagnosticKind::OutOfRange(p),
        other => DiagnosticKind::MalformedRule(other.to_string()),
    }
}
