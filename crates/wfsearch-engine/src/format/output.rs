// Result lines.
//
// Every decode produces exactly one line, so batch output stays aligned with
// its input. Running out of budget prints the same sentinel as "no path".

use wfsearch_core::Outcome;

/// Sentinel for a transducer input with no accepting path.
pub const NO_TRANSDUCTION: &str = "*none* 0";
/// Sentinel for a tagger or analyser input with no accepting path.
pub const NO_PATH: &str = "*NONE*";

/// Significant digits printed for transduction scores.
const SCORE_DIGITS: usize = 6;

/// `input => "o1" "o2" prob`, with the probability in plain decimal or, when
/// `log` is set, as a base-10 log. Either way the number is printed with six
/// significant digits, like C's `%g`.
pub fn format_transduction(input: &str, outcome: &Outcome, log: bool) -> String {
    let Some(path) = outcome.path() else {
        return format!("{input} => {NO_TRANSDUCTION}");
    };
    let mut line = format!("{input} =>");
    for out in &path.outputs {
        line.push_str(" \"");
        line.push_str(out);
        line.push('"');
    }
    let score = if log {
        path.log_prob.log10()
    } else {
        path.prob()
    };
    line.push(' ');
    line.push_str(&general(score, SCORE_DIGITS));
    line
}

/// Render `x` with `digits` significant digits in the style of `%g`: fixed
/// notation for moderate exponents, scientific otherwise, trailing zeros
/// dropped.
pub fn general(x: f64, digits: usize) -> String {
    if x == 0.0 || !x.is_finite() {
        return format!("{x}");
    }
    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.unsigned_abs())
    } else {
        let decimals = (digits as i32 - 1 - exp) as usize;
        trim_fraction(&format!("{x:.decimals$}")).to_owned()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// `observation => s0 s1 ... sn log10prob`.
pub fn format_tagging(observation: &str, outcome: &Outcome) -> String {
    match outcome.path() {
        Some(path) => format!(
            "{observation} => {} {}",
            path.states.join(" "),
            path.log_prob
        ),
        None => format!("{observation} => {NO_PATH}"),
    }
}

/// `word => speak/irreg_verb_stem s/3sg`: outputs run together, with a
/// break after each `/class` marker.
pub fn format_morph(word: &str, outcome: &Outcome) -> String {
    let Some(path) = outcome.path() else {
        return format!("{word} => {NO_PATH}");
    };
    let mut analysis = String::new();
    for out in &path.outputs {
        analysis.push_str(out);
        if out.starts_with('/') {
            analysis.push(' ');
        }
    }
    format!("{word} => {}", analysis.trim_end())
}

/// `word => yes` or `word => no`.
pub fn format_acceptance(word: &str, outcome: &Outcome) -> String {
    let answer = if outcome.is_found() { "yes" } else { "no" };
    format!("{word} => {answer}")
}

/// Rewrite one tagger output line as `w1/t1 w2/t2 ...`.
///
/// Tags come from states 1..=n (the start state has no word) and are the
/// last `_` component of the state label, so `DT_NN` tags as `NN`. Returns
/// `None` for "no path" lines and for lines that are not tagger output.
pub fn tagged_to_annotated(line: &str) -> Option<String> {
    let (obs, rest) = line.split_once("=>")?;
    let words: Vec<&str> = obs.split_whitespace().collect();
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // Start state, one state per word, trailing score.
    if fields.len() != words.len() + 2 {
        return None;
    }
    let tags = &fields[1..fields.len() - 1];
    let pairs: Vec<String> = words
        .iter()
        .zip(tags)
        .map(|(w, &state)| {
            let tag = state.rsplit('_').next().unwrap_or(state);
            format!("{w}/{tag}")
        })
        .collect();
    Some(pairs.join(" "))
}

/// Tokens of one transducer input line. Whitespace separates tokens and
/// double quotes group them, quotes removed; parentheses are ordinary
/// characters. An unterminated quote runs to the end of the line.
pub fn transducer_input(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        let mut text = String::new();
        if c == '"' {
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                text.push(ch);
            }
        } else {
            text.push(c);
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '"' {
                    break;
                }
                text.push(ch);
                chars.next();
            }
        }
        tokens.push(text);
    }
    tokens
}

/// One observation per character, for analysing a word with a
/// character-level transducer.
pub fn word_chars(word: &str) -> Vec<String> {
    word.chars().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfsearch_core::{LogProb, WinningPath};

    fn found(states: &[&str], outputs: &[&str], log10: f64) -> Outcome {
        Outcome::Found(WinningPath {
            states: states.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            log_prob: LogProb::from_log10(log10),
        })
    }

    #[test]
    fn transduction_lines() {
        let o = found(&["0", "1", "1"], &["b", "b"], 0.0);
        assert_eq!(format_transduction("\"a\" \"a\"", &o, false), "\"a\" \"a\" => \"b\" \"b\" 1");
        assert_eq!(format_transduction("a a", &o, true), "a a => \"b\" \"b\" 0");
        assert_eq!(format_transduction("c", &Outcome::NoPath, false), "c => *none* 0");
        let exhausted = Outcome::BudgetExhausted { expansions: 9 };
        assert_eq!(format_transduction("c", &exhausted, true), "c => *none* 0");
    }

    #[test]
    fn transduction_scores_use_six_significant_digits() {
        let o = found(&["0", "1", "1"], &["b", "b"], (0.1f64 * 0.2).log10());
        assert_eq!(format_transduction("a a", &o, false), "a a => \"b\" \"b\" 0.02");
        assert_eq!(format_transduction("a a", &o, true), "a a => \"b\" \"b\" -1.69897");
    }

    #[test]
    fn general_number_format() {
        assert_eq!(general(0.020000000000000004, 6), "0.02");
        assert_eq!(general(1.0, 6), "1");
        assert_eq!(general(-2.0, 6), "-2");
        assert_eq!(general(0.0, 6), "0");
        assert_eq!(general(0.0001234567, 6), "0.000123457");
        assert_eq!(general(0.00001, 6), "1e-05");
        assert_eq!(general(123456789.0, 6), "1.23457e+08");
        assert_eq!(general(-0.5, 6), "-0.5");
        assert_eq!(general(f64::NEG_INFINITY, 6), "-inf");
    }

    #[test]
    fn tagging_lines() {
        let o = found(&["BOS", "N", "V"], &["N", "V"], -2.0);
        assert_eq!(format_tagging("they fish", &o), "they fish => BOS N V -2");
        assert_eq!(format_tagging("xyz", &Outcome::NoPath), "xyz => *NONE*");
    }

    #[test]
    fn morph_lines() {
        let o = found(&[], &["s", "p", "e", "a", "k", "/irreg_verb_stem", "s", "/3sg"], 0.0);
        assert_eq!(format_morph("speaks", &o), "speaks => speak/irreg_verb_stem s/3sg");
        assert_eq!(format_morph("speaked", &Outcome::NoPath), "speaked => *NONE*");
        assert_eq!(format_acceptance("speaks", &o), "speaks => yes");
        assert_eq!(format_acceptance("speaked", &Outcome::NoPath), "speaked => no");
    }

    #[test]
    fn annotated_text_from_tagger_output() {
        assert_eq!(
            tagged_to_annotated("the dog => BOS_BOS BOS_DT DT_NN -3.2").as_deref(),
            Some("the/DT dog/NN")
        );
        assert_eq!(
            tagged_to_annotated("they fish => BOS N V -1.04").as_deref(),
            Some("they/N fish/V")
        );
        assert_eq!(tagged_to_annotated("they fish => *NONE*"), None);
        assert_eq!(tagged_to_annotated("no arrow here"), None);
    }

    #[test]
    fn input_tokenization() {
        assert_eq!(transducer_input("\"a\" \"b c\" d"), vec!["a", "b c", "d"]);
        assert_eq!(transducer_input("\"a \"b"), vec!["a ", "b"]);
        assert_eq!(transducer_input("\"open"), vec!["open"]);
        assert_eq!(transducer_input("( a )"), vec!["(", "a", ")"]);
        assert_eq!(transducer_input("a(b \"(\")"), vec!["a(b", "(", ")"]);
        assert_eq!(word_chars("héj"), vec!["h", "é", "j"]);
    }
}
