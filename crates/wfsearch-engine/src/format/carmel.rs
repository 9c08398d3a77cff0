// Carmel-style transducer rule files.
//
//   F
//   (S (T "in" "out" 0.5))
//   (T (F "in" 1))
//   (T (F *e*))
//
// The first content line names the final state; the start state is the
// source of the first rule.

use std::fmt::Write as _;

use super::{Diagnostic, DiagnosticKind, content_lines, parse_prob};
use crate::pfst::{EPSILON, Input, Pfst, PfstBuilder};
use crate::{ModelError, SearchSpace};

/// A transducer plus everything the parser had to skip or overwrite.
#[derive(Debug, Clone)]
pub struct ParsedPfst {
    pub pfst: Pfst,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Open,
    Close,
    Word { text: String, quoted: bool },
}

pub(crate) fn tokenize(line: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(ch) => text.push(ch),
                        None => return Err("unterminated quote".into()),
                    }
                }
                tokens.push(Token::Word { text, quoted: true });
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut text = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_whitespace() || matches!(ch, '(' | ')' | '"') {
                        break;
                    }
                    text.push(ch);
                    chars.next();
                }
                tokens.push(Token::Word {
                    text,
                    quoted: false,
                });
            }
        }
    }
    Ok(tokens)
}

/// A word token with its quoting preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Word {
    pub text: String,
    pub quoted: bool,
}

impl Word {
    /// True for an unquoted token that reads as a number.
    fn is_number(&self) -> bool {
        !self.quoted && self.text.parse::<f64>().is_ok()
    }
}

/// One `(from (to label...))` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RuleLine {
    pub from: String,
    pub to: String,
    pub labels: Vec<Word>,
}

/// Parse the shared `(from (to label...))` shape. Also used for
/// morphotactic rule files.
pub(crate) fn parse_rule_line(line: &str) -> Result<RuleLine, String> {
    fn word(what: &str, it: &mut impl Iterator<Item = Token>) -> Result<String, String> {
        match it.next() {
            Some(Token::Word { text, .. }) => Ok(text),
            _ => Err(format!("expected {what}")),
        }
    }

    let mut it = tokenize(line)?.into_iter();
    if it.next() != Some(Token::Open) {
        return Err("expected `(`".into());
    }
    let from = word("source state", &mut it)?;
    if it.next() != Some(Token::Open) {
        return Err("expected `(` before target state".into());
    }
    let to = word("target state", &mut it)?;
    let mut labels = Vec::new();
    loop {
        match it.next() {
            Some(Token::Word { text, quoted }) => labels.push(Word { text, quoted }),
            Some(Token::Close) => break,
            Some(Token::Open) => return Err("unexpected `(`".into()),
            None => return Err("missing `)`".into()),
        }
    }
    if it.next() != Some(Token::Close) {
        return Err("missing outer `)`".into());
    }
    if it.next().is_some() {
        return Err("trailing tokens after rule".into());
    }
    Ok(RuleLine { from, to, labels })
}

/// `(input, output, prob)` from a rule's labels.
fn arc_labels(labels: &[Word]) -> Result<(String, String, f64), DiagnosticKind> {
    let (symbols, prob) = match labels {
        [.., last] if labels.len() >= 2 && last.is_number() => {
            (&labels[..labels.len() - 1], parse_prob(&last.text)?)
        }
        _ => (labels, 1.0),
    };
    match symbols {
        [io] => Ok((io.text.clone(), io.text.clone(), prob)),
        [i, o] => Ok((i.text.clone(), o.text.clone(), prob)),
        [] => Err(DiagnosticKind::MalformedRule("rule has no labels".into())),
        [.., last] => Err(DiagnosticKind::BadProbability(last.text.clone())),
    }
}

// ---------------------------------------------------------------------------
// Reader / writer
// ---------------------------------------------------------------------------

/// Parse a rule file into a [`Pfst`].
///
/// Fails only when the file has no final-state line or no usable rule.
pub fn parse_pfst(text: &str) -> Result<ParsedPfst, ModelError> {
    let mut lines = content_lines(text);
    let (_, finish) = lines.next().ok_or(ModelError::MissingFinal)?;

    let mut builder = PfstBuilder::new();
    let finish = builder.state(finish);
    builder.set_finish(finish);

    let mut diagnostics = Vec::new();
    for (line_no, line) in lines {
        let rule = match parse_rule_line(line) {
            Ok(rule) => rule,
            Err(msg) => {
                diagnostics.push(Diagnostic::new(line_no, DiagnosticKind::MalformedRule(msg)));
                continue;
            }
        };
        let (input, output, prob) = match arc_labels(&rule.labels) {
            Ok(labels) => labels,
            Err(kind) => {
                diagnostics.push(Diagnostic::new(line_no, kind));
                continue;
            }
        };
        let from = builder.state(&rule.from);
        let to = builder.state(&rule.to);
        if builder.start().is_none() {
            builder.set_start(from);
        }
        match builder.add_arc(from, Some(&input), to, Some(&output), prob) {
            Ok(false) => {}
            Ok(true) => diagnostics.push(Diagnostic::new(line_no, DiagnosticKind::Duplicate)),
            Err(ModelError::ProbabilityOutOfRange(p)) => {
                diagnostics.push(Diagnostic::new(line_no, DiagnosticKind::OutOfRange(p)))
            }
            Err(err) => return Err(err),
        }
    }
    if builder.start().is_none() {
        return Err(ModelError::NoRules);
    }
    Ok(ParsedPfst {
        pfst: builder.build()?,
        diagnostics,
    })
}

fn needs_quotes(label: &str) -> bool {
    label.is_empty()
        || label
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"'))
}

fn write_state(out: &mut String, name: &str) {
    if needs_quotes(name) {
        let _ = write!(out, "\"{name}\"");
    } else {
        out.push_str(name);
    }
}

fn write_symbol(out: &mut String, name: Option<&str>) {
    match name {
        None => out.push_str(EPSILON),
        Some(name) => {
            let _ = write!(out, "\"{name}\"");
        }
    }
}

/// Render a transducer in rule-file form. Rules leaving the start state come
/// first so the file reads back with the same start state.
pub fn write_pfst(pfst: &Pfst) -> String {
    let mut out = String::new();
    write_state(&mut out, pfst.state_name(pfst.finish()));
    out.push('\n');

    let start = pfst.start();
    let from_start = pfst.arcs().filter(|(from, _, _)| *from == start);
    let rest = pfst.arcs().filter(|(from, _, _)| *from != start);
    for (from, input, arc) in from_start.chain(rest) {
        out.push('(');
        write_state(&mut out, pfst.state_name(from));
        out.push_str(" (");
        write_state(&mut out, pfst.state_name(arc.to));
        out.push(' ');
        let input = match input {
            Input::Epsilon => None,
            Input::Symbol(s) => Some(pfst.symbol_name(s)),
        };
        write_symbol(&mut out, input);
        out.push(' ');
        write_symbol(&mut out, arc.output.map(|s| pfst.symbol_name(s)));
        let _ = writeln!(out, " {}))", arc.prob);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decoder, SearchConfig};

    #[test]
    fn tokenizer_handles_quotes_and_parens() {
        let toks = tokenize(r#"(0 (1 "a b" *e* 0.5))"#).unwrap();
        assert_eq!(toks.len(), 9);
        assert_eq!(
            toks[4],
            Token::Word {
                text: "a b".into(),
                quoted: true
            }
        );
        assert!(tokenize(r#"(0 (1 "open))"#).is_err());
    }

    #[test]
    fn rule_line_shapes() {
        let rule = parse_rule_line("(q0 (q1 irreg_verb_stem))").unwrap();
        assert_eq!(rule.from, "q0");
        assert_eq!(rule.to, "q1");
        assert_eq!(rule.labels.len(), 1);
        assert!(parse_rule_line("(q0 q1 a)").is_err());
        assert!(parse_rule_line("(q0 (q1 a)").is_err());
        assert!(parse_rule_line("(q0 (q1 a)) extra").is_err());
    }

    #[test]
    fn label_forms() {
        let w = |t: &str, q: bool| Word {
            text: t.into(),
            quoted: q,
        };
        assert_eq!(
            arc_labels(&[w("a", true)]).unwrap(),
            ("a".into(), "a".into(), 1.0)
        );
        assert_eq!(
            arc_labels(&[w("a", true), w("0.5", false)]).unwrap(),
            ("a".into(), "a".into(), 0.5)
        );
        assert_eq!(
            arc_labels(&[w("a", true), w("0.5", true)]).unwrap(),
            ("a".into(), "0.5".into(), 1.0)
        );
        assert_eq!(
            arc_labels(&[w("a", true), w("b", true), w("0.25", false)]).unwrap(),
            ("a".into(), "b".into(), 0.25)
        );
        assert!(arc_labels(&[w("a", true), w("b", true), w("c", true)]).is_err());
    }

    #[test]
    fn parses_acceptor_and_decodes() {
        let parsed = parse_pfst("1\n(0 (1 \"a\" \"b\" 1.0))\n(1 (1 \"a\" \"b\" 1.0))\n").unwrap();
        assert!(parsed.diagnostics.is_empty());
        let fst = parsed.pfst;
        assert_eq!(fst.state_name(fst.start()), "0");
        assert_eq!(fst.state_name(fst.finish()), "1");
        let decoder = Decoder::new(&fst, SearchConfig::default());
        let path = decoder.decode_line("a a");
        assert_eq!(path.into_path().unwrap().outputs, vec!["b", "b"]);
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let text = "# final\nF\n(S (F a 2.0))\n(S F a)\n(S (F a 0.5))\n(S (F a 0.25))\n";
        let parsed = parse_pfst(text).unwrap();
        let kinds: Vec<_> = parsed.diagnostics.iter().map(|d| (d.line, &d.kind)).collect();
        assert_eq!(kinds.len(), 3);
        assert_eq!(kinds[0], (3, &DiagnosticKind::OutOfRange(2.0)));
        assert!(matches!(kinds[1], (4, DiagnosticKind::MalformedRule(_))));
        assert_eq!(kinds[2], (6, &DiagnosticKind::Duplicate));
        assert_eq!(parsed.pfst.num_arcs(), 1);
        assert_eq!(parsed.pfst.arcs().next().unwrap().2.prob, 0.25);
    }

    #[test]
    fn empty_or_rule_free_files_are_errors() {
        assert_eq!(parse_pfst("# nothing\n").unwrap_err(), ModelError::MissingFinal);
        assert_eq!(parse_pfst("F\n(S F)\n").unwrap_err(), ModelError::NoRules);
    }

    #[test]
    fn written_rules_read_back_identically() {
        let text = "F\n(S (A \"x\" *e* 0.5))\n(A (F *e* \"y\"))\n(S (F \"a b\" \"c\" 0.5))\n";
        let first = parse_pfst(text).unwrap().pfst;
        let written = write_pfst(&first);
        let second = parse_pfst(&written).unwrap();
        assert!(second.diagnostics.is_empty());
        assert_eq!(write_pfst(&second.pfst), written);
        assert_eq!(second.pfst.num_arcs(), 3);
        assert!(second.pfst.has_epsilons());
    }
}
