// Model checks: header counts against file content, and the stochastic
// constraints (outgoing probabilities of a state sum to one).
//
// Nothing here is fatal. A partial model is still decodable, so every
// finding is a warning line.

use std::fmt;

use crate::SearchSpace;
use crate::format::hmm_file::ParsedHmm;
use crate::hmm::Hmm;
use crate::pfst::Pfst;

/// Allowed deviation of a probability sum from 1.
pub const SUM_TOLERANCE: f64 = 1e-5;

/// Header fields checked, in report order.
pub const HEADER_FIELDS: [&str; 5] = [
    "state_num",
    "sym_num",
    "init_line_num",
    "trans_line_num",
    "emiss_line_num",
];

/// Outcome of checking one header field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCheck {
    Matches { field: &'static str, value: usize },
    Differs {
        field: &'static str,
        claimed: String,
        real: usize,
    },
}

/// Which probability table a sum belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumKind {
    Init,
    Transition,
    Emission,
    Outgoing,
}

impl SumKind {
    fn name(self) -> &'static str {
        match self {
            SumKind::Init => "init_prob_sum",
            SumKind::Transition => "trans_prob_sum",
            SumKind::Emission => "emiss_prob_sum",
            SumKind::Outgoing => "outgoing_prob_sum",
        }
    }
}

/// A probability sum that is not 1 within [`SUM_TOLERANCE`].
#[derive(Debug, Clone, PartialEq)]
pub struct SumWarning {
    pub kind: SumKind,
    /// `None` for the initial distribution, which is not per state.
    pub state: Option<String>,
    pub sum: f64,
}

impl fmt::Display for SumWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            Some(state) => write!(
                f,
                "warning: the {} for state {} is {}",
                self.kind.name(),
                state,
                self.sum
            ),
            None => write!(f, "warning: the {} is {}", self.kind.name(), self.sum),
        }
    }
}

/// Everything `check_hmm` found, printable as the report.
#[derive(Debug, Clone, PartialEq)]
pub struct HmmReport {
    pub fields: Vec<FieldCheck>,
    pub sums: Vec<SumWarning>,
}

impl HmmReport {
    /// True when the header matches and every sum is 1.
    pub fn is_clean(&self) -> bool {
        self.sums.is_empty()
            && self
                .fields
                .iter()
                .all(|f| matches!(f, FieldCheck::Matches { .. }))
    }

    /// Report lines that flag a problem: header mismatches, then bad sums.
    pub fn warnings(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| matches!(f, FieldCheck::Differs { .. }))
            .map(ToString::to_string)
            .chain(self.sums.iter().map(ToString::to_string))
            .collect()
    }
}

impl fmt::Display for FieldCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldCheck::Matches { field, value } => write!(f, "{field}={value}"),
            FieldCheck::Differs {
                field,
                claimed,
                real,
            } => write!(
                f,
                "warning: different numbers of {field}: claimed={claimed}, real={real}"
            ),
        }
    }
}

impl fmt::Display for HmmReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            writeln!(f, "{field}")?;
        }
        for warning in &self.sums {
            writeln!(f, "{warning}")?;
        }
        Ok(())
    }
}

fn off_by(sum: f64) -> bool {
    (sum - 1.0).abs() > SUM_TOLERANCE
}

/// Claimed count as written; a missing field claims nothing.
fn claimed_matches(claimed: Option<&str>, real: usize) -> bool {
    claimed
        .and_then(|c| c.parse::<f64>().ok())
        .is_some_and(|c| c == real as f64)
}

/// Check a parsed HMM file against its own header and the stochastic
/// constraints.
pub fn check_hmm(parsed: &ParsedHmm) -> HmmReport {
    let c = &parsed.counts;
    let real = [
        c.states,
        c.symbols,
        c.init_lines,
        c.trans_lines,
        c.emiss_lines,
    ];
    let fields = HEADER_FIELDS
        .iter()
        .zip(real)
        .map(|(&field, real)| {
            let claimed = parsed.header_value(field);
            if claimed_matches(claimed, real) {
                FieldCheck::Matches { field, value: real }
            } else {
                FieldCheck::Differs {
                    field,
                    claimed: claimed.unwrap_or("none").to_owned(),
                    real,
                }
            }
        })
        .collect();
    HmmReport {
        fields,
        sums: hmm_sum_warnings(&parsed.hmm),
    }
}

/// Stochastic-constraint warnings for an HMM.
pub fn hmm_sum_warnings(hmm: &Hmm) -> Vec<SumWarning> {
    let mut warnings = Vec::new();
    let init: f64 = hmm.initial_distribution().iter().map(|(_, p)| p).sum();
    if off_by(init) {
        warnings.push(SumWarning {
            kind: SumKind::Init,
            state: None,
            sum: init,
        });
    }
    for (kind, sums) in [
        (SumKind::Transition, hmm.transition_sums()),
        (SumKind::Emission, hmm.emission_sums()),
    ] {
        warnings.extend(sums.into_iter().filter(|(_, s)| off_by(*s)).map(|(state, sum)| {
            SumWarning {
                kind,
                state: Some(hmm.state_name(state).to_owned()),
                sum,
            }
        }));
    }
    warnings
}

/// States of a transducer whose outgoing arcs, over all inputs, do not sum
/// to 1.
pub fn check_pfst(pfst: &Pfst) -> Vec<SumWarning> {
    pfst.outgoing_sums()
        .into_iter()
        .filter(|(_, s)| off_by(*s))
        .map(|(state, sum)| SumWarning {
            kind: SumKind::Outgoing,
            state: Some(pfst.state_name(state).to_owned()),
            sum,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{parse_hmm, parse_pfst};

    const GOOD: &str = "\
state_num=2
sym_num=2
init_line_num=1
trans_line_num=2
emiss_line_num=3
\\init
A 1.0
\\transition
A B 0.5
A A 0.5
\\emission
A x 0.5
A y 0.5
B x 1.0
";

    #[test]
    fn clean_model_echoes_the_header() {
        let report = check_hmm(&parse_hmm(GOOD));
        assert!(report.is_clean());
        assert!(report.warnings().is_empty());
        assert_eq!(
            report.to_string(),
            "state_num=2\nsym_num=2\ninit_line_num=1\ntrans_line_num=2\nemiss_line_num=3\n"
        );
    }

    #[test]
    fn mismatches_and_bad_sums_are_reported() {
        let text = GOOD
            .replace("state_num=2", "state_num=5")
            .replace("A A 0.5", "A A 0.25")
            .replace("B x 1.0", "B x 0.5");
        let report = check_hmm(&parse_hmm(&text));
        assert!(!report.is_clean());
        let out = report.to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "warning: different numbers of state_num: claimed=5, real=2");
        assert_eq!(lines[1], "sym_num=2");
        assert_eq!(lines[5], "warning: the trans_prob_sum for state A is 0.75");
        assert_eq!(lines[6], "warning: the emiss_prob_sum for state B is 0.5");
        assert_eq!(lines.len(), 7);
        assert_eq!(
            report.warnings(),
            vec![lines[0], lines[5], lines[6]]
        );
    }

    #[test]
    fn missing_header_field_and_init_sum() {
        let text = GOOD
            .replace("sym_num=2\n", "")
            .replace("A 1.0", "A 0.5");
        let report = check_hmm(&parse_hmm(&text));
        let out = report.to_string();
        assert!(out.contains("warning: different numbers of sym_num: claimed=none, real=2"));
        assert!(out.contains("warning: the init_prob_sum is 0.5"));
    }

    #[test]
    fn claimed_counts_may_be_written_as_floats() {
        assert!(claimed_matches(Some("3.0"), 3));
        assert!(!claimed_matches(Some("three"), 3));
        assert!(!claimed_matches(None, 0));
    }

    #[test]
    fn transducer_outgoing_sums() {
        let fst = parse_pfst("F\n(S (F a 0.5))\n(S (F b 0.25))\n(F (F a 1))\n")
            .unwrap()
            .pfst;
        let warnings = check_pfst(&fst);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].to_string(),
            "warning: the outgoing_prob_sum for state S is 0.75"
        );
    }
}
