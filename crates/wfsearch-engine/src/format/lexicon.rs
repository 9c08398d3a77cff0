// Morphotactic expansion: turn a lexicon plus class-level rules into a
// character-level transducer.
//
// A rule `(q0 (q1 reg_verb_stem))` lets any `reg_verb_stem` word move the
// machine from q0 to q1. Expansion spells each such word out one character
// per arc from q0, then takes an epsilon-input arc to q1 that writes
// `/reg_verb_stem`, so a decode yields `walk/reg_verb_stem ed/past`.

use hashbrown::HashSet;

use super::carmel::parse_rule_line;
use super::{Diagnostic, DiagnosticKind, content_lines};
use crate::ModelError;
use crate::pfst::{EPSILON, Pfst, PfstBuilder};

/// One `word class` lexicon line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    pub line: usize,
    pub word: String,
    pub class: String,
}

/// `from --class--> to` at the class level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphRule {
    pub from: String,
    pub to: String,
    pub class: String,
}

/// Class-level automaton read from a morphotactic rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morphotactics {
    pub start: String,
    pub finish: String,
    pub rules: Vec<MorphRule>,
}

impl Morphotactics {
    /// Rules for `class` grouped by source state, in first-appearance order.
    fn by_source(&self, class: &str) -> Vec<(&str, Vec<&str>)> {
        let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
        for rule in self.rules.iter().filter(|r| r.class == class) {
            match groups.iter_mut().find(|(from, _)| *from == rule.from) {
                Some((_, targets)) => targets.push(&rule.to),
                None => groups.push((&rule.from, vec![&rule.to])),
            }
        }
        groups
    }
}

/// Result of [`expand`].
#[derive(Debug, Clone)]
pub struct Expansion {
    pub pfst: Pfst,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `word class` lines. Lines with any other field count are skipped.
pub fn parse_lexicon(text: &str) -> (Vec<LexiconEntry>, Vec<Diagnostic>) {
    let mut entries = Vec::new();
    let mut diagnostics = Vec::new();
    for (line_no, line) in content_lines(text) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [word, class] => entries.push(LexiconEntry {
                line: line_no,
                word: (*word).to_owned(),
                class: (*class).to_owned(),
            }),
            other => diagnostics.push(Diagnostic::new(
                line_no,
                DiagnosticKind::MalformedLexicon(other.len()),
            )),
        }
    }
    (entries, diagnostics)
}

/// Parse a class-level rule file: final state on the first line, then
/// `(from (to class))` rules. The first rule's source is the start state.
pub fn parse_morphotactics(text: &str) -> Result<(Morphotactics, Vec<Diagnostic>), ModelError> {
    let mut lines = content_lines(text);
    let (_, finish) = lines.next().ok_or(ModelError::MissingFinal)?;
    let mut rules = Vec::new();
    let mut diagnostics = Vec::new();
    for (line_no, line) in lines {
        match parse_rule_line(line) {
            Ok(mut rule) if rule.labels.len() == 1 => {
                let class = rule.labels.swap_remove(0).text;
                rules.push(MorphRule {
                    from: rule.from,
                    to: rule.to,
                    class,
                });
            }
            Ok(rule) => diagnostics.push(Diagnostic::new(
                line_no,
                DiagnosticKind::MalformedRule(format!(
                    "expected one class label, found {}",
                    rule.labels.len()
                )),
            )),
            Err(msg) => {
                diagnostics.push(Diagnostic::new(line_no, DiagnosticKind::MalformedRule(msg)))
            }
        }
    }
    let start = rules.first().ok_or(ModelError::NoRules)?.from.clone();
    Ok((
        Morphotactics {
            start,
            finish: finish.to_owned(),
            rules,
        },
        diagnostics,
    ))
}

/// Expand `lexicon` through `rules` into a character-level transducer.
///
/// Every chain state is fresh, so two words never share a prefix path and
/// no chain state can collide with a rule state.
pub fn expand(lexicon: &[LexiconEntry], rules: &Morphotactics) -> Result<Expansion, ModelError> {
    let mut builder = PfstBuilder::new();
    let start = builder.state(&rules.start);
    let finish = builder.state(&rules.finish);
    builder.set_start(start);
    builder.set_finish(finish);

    let classes: HashSet<&str> = rules.rules.iter().map(|r| r.class.as_str()).collect();
    let mut diagnostics = Vec::new();
    let mut buf = [0u8; 4];
    for entry in lexicon {
        if !classes.contains(entry.class.as_str()) {
            diagnostics.push(Diagnostic::new(
                entry.line,
                DiagnosticKind::UnknownClass(entry.class.clone()),
            ));
            continue;
        }
        let tag = format!("/{}", entry.class);
        for (from, targets) in rules.by_source(&entry.class) {
            let mut cur = builder.state(from);
            let mut stem = from.to_owned();
            for ch in entry.word.chars() {
                stem.push(ch);
                let next = builder.fresh_state(&stem);
                let ch: &str = ch.encode_utf8(&mut buf);
                builder.add_arc(cur, Some(ch), next, Some(ch), 1.0)?;
                cur = next;
            }
            for to in targets {
                let to = builder.state(to);
                builder.add_arc(cur, None, to, Some(&tag), 1.0)?;
            }
        }
    }

    for rule in rules.rules.iter().filter(|r| r.class == EPSILON) {
        let from = builder.state(&rule.from);
        let to = builder.state(&rule.to);
        builder.add_arc(from, None, to, None, 1.0)?;
    }

    Ok(Expansion {
        pfst: builder.build()?,
        diagnostics,
    })
}
