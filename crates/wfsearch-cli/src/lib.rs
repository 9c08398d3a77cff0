// wfsearch-cli: shared utilities for CLI tools.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;
use std::time::Duration;

use tracing::warn;
use tracing_subscriber::EnvFilter;
use wfsearch_core::{Outcome, Strategy};
use wfsearch_engine::format::Diagnostic;
use wfsearch_engine::validate::HmmReport;
use wfsearch_engine::{SearchBudget, SearchConfig};

/// Environment variable holding the log filter (`tracing_subscriber` syntax).
pub const LOG_ENV: &str = "WFSEARCH_LOG";

/// Environment variable selecting the default search strategy.
pub const STRATEGY_ENV: &str = "WFSEARCH_STRATEGY";

/// Environment variable holding the default expansion budget.
pub const MAX_STEPS_ENV: &str = "WFSEARCH_MAX_STEPS";

/// Help text for the options understood by [`parse_search_options`].
pub const SEARCH_OPTIONS_HELP: &str = "\
  -s, --strategy NAME     Frontier strategy: layer (default) or best-first
  --max-steps N           Give up after N state expansions
  --time-limit-ms N       Give up after N milliseconds per sequence
  -v, --verbose           Log at debug level
  -h, --help              Print this help";

/// Search settings and logging level taken from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub config: SearchConfig,
    pub verbose: bool,
}

/// Parse the search options shared by the decoding tools.
///
/// Flags win over the `WFSEARCH_STRATEGY` / `WFSEARCH_MAX_STEPS`
/// environment variables. Returns `(options, remaining_args)`.
pub fn parse_search_options(args: &[String]) -> Result<(SearchOptions, Vec<String>), String> {
    parse_search_options_with(args, |key| std::env::var(key).ok())
}

/// [`parse_search_options`] with an explicit environment lookup.
pub fn parse_search_options_with(
    args: &[String],
    env: impl Fn(&str) -> Option<String>,
) -> Result<(SearchOptions, Vec<String>), String> {
    let mut strategy: Option<String> = None;
    let mut max_steps: Option<String> = None;
    let mut time_limit: Option<String> = None;
    let mut verbose = false;
    let mut remaining = Vec::new();

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        let mut value = |name: &str| {
            it.next()
                .cloned()
                .ok_or_else(|| format!("{name} requires a value"))
        };
        match arg.as_str() {
            "-s" | "--strategy" => strategy = Some(value(arg)?),
            "--max-steps" => max_steps = Some(value(arg)?),
            "--time-limit-ms" => time_limit = Some(value(arg)?),
            "-v" | "--verbose" => verbose = true,
            _ => {
                if let Some(v) = arg.strip_prefix("--strategy=") {
                    strategy = Some(v.to_string());
                } else if let Some(v) = arg.strip_prefix("--max-steps=") {
                    max_steps = Some(v.to_string());
                } else if let Some(v) = arg.strip_prefix("--time-limit-ms=") {
                    time_limit = Some(v.to_string());
                } else {
                    remaining.push(arg.clone());
                }
            }
        }
    }

    let strategy = match strategy.or_else(|| env(STRATEGY_ENV)) {
        Some(name) => name.parse::<Strategy>().map_err(|e| e.to_string())?,
        None => Strategy::default(),
    };
    let mut budget = SearchBudget::unbounded();
    if let Some(n) = max_steps.or_else(|| env(MAX_STEPS_ENV)) {
        let n: u64 = n
            .parse()
            .map_err(|_| format!("invalid number for --max-steps: {n}"))?;
        budget = budget.with_max_expansions(n);
    }
    if let Some(ms) = time_limit {
        let ms: u64 = ms
            .parse()
            .map_err(|_| format!("invalid number for --time-limit-ms: {ms}"))?;
        budget = budget.with_time_limit(Duration::from_millis(ms));
    }

    Ok((
        SearchOptions {
            config: SearchConfig::new(strategy).with_budget(budget),
            verbose,
        },
        remaining,
    ))
}

/// Remove every occurrence of a boolean flag. Returns whether it was present.
pub fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

/// Install the stderr log subscriber. `WFSEARCH_LOG` overrides the level;
/// otherwise `verbose` selects `debug` over `warn`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Read a whole input file.
pub fn read_file(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))
}

/// Open the output destination. `None` or `-` means stdout.
pub fn open_output(path: Option<&str>) -> Result<Box<dyn Write>, String> {
    match path {
        None | Some("-") => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
        Some(path) => {
            let file = File::create(path).map_err(|e| format!("failed to create {path}: {e}"))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

/// Split positional arguments into `required` input paths and an optional
/// output path. `None` when the count is wrong.
pub fn split_paths(args: &[String], required: usize) -> Option<(Vec<String>, Option<String>)> {
    let mut paths: Vec<String> = args
        .iter()
        .filter(|a| *a == "-" || !a.starts_with('-'))
        .cloned()
        .collect();
    if paths.len() == required {
        Some((paths, None))
    } else if paths.len() == required + 1 {
        let output = paths.pop();
        Some((paths, output))
    } else {
        None
    }
}

/// Observation lines of an input file: trimmed, skipping blanks. A line
/// starting with `#` is an ordinary observation.
pub fn input_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

/// Like [`input_lines`], also skipping `#` comment lines.
pub fn commented_input_lines(text: &str) -> Vec<&str> {
    let mut lines = input_lines(text);
    lines.retain(|l| !l.starts_with('#'));
    lines
}

/// Log parse diagnostics for `path`, then a count of dropped lines.
pub fn report_diagnostics<'a>(path: &str, diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    let mut skipped = 0usize;
    for d in diagnostics {
        if d.skipped_line() {
            skipped += 1;
        }
        warn!("{path}: {d}");
    }
    if skipped > 0 {
        warn!("{path}: skipped {skipped} malformed line(s)");
    }
}

/// Log each header mismatch and bad probability sum found in an HMM file.
/// Returns how many were logged.
pub fn report_hmm_checks(path: &str, report: &HmmReport) -> usize {
    let warnings = report.warnings();
    for line in &warnings {
        warn!("{path}: {line}");
    }
    warnings.len()
}

/// Log a warning when a sequence ran out of budget.
pub fn note_exhausted(input: &str, outcome: &Outcome) {
    if let Outcome::BudgetExhausted { expansions } = outcome {
        warn!(expansions, "search budget exhausted for `{input}`");
    }
}

/// One JSON object per decoded line: `{"input": ..., "status": ..., ...}`.
pub fn json_line(input: &str, outcome: &Outcome) -> String {
    let mut value = serde_json::to_value(outcome).unwrap_or(serde_json::Value::Null);
    if let serde_json::Value::Object(map) = &mut value {
        map.insert("input".into(), serde_json::Value::String(input.to_string()));
    }
    value.to_string()
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}
