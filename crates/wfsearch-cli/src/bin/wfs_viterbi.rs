// wfs-viterbi: Tag observation sequences with a hidden Markov model.
//
// Reads an HMM parameter file and an input file with one observation
// sequence per line. Prints the most probable state sequence for each line
// together with its log10 probability. Header mismatches and probability
// sums that are not 1 are logged as warnings.
//
// Usage:
//   wfs-viterbi [OPTIONS] HMM INPUT [OUTPUT]
//
// Options:
//   -s, --strategy NAME   Frontier strategy: layer or best-first
//   --max-steps N         Expansion budget per sequence
//   --time-limit-ms N     Time budget per sequence
//   --json                Print one JSON object per line
//   -v, --verbose         Log at debug level
//   -h, --help            Print help

use std::io::Write;

use wfsearch_cli::{
    SEARCH_OPTIONS_HELP, fatal, init_logging, input_lines, json_line, note_exhausted,
    open_output, parse_search_options, read_file, report_diagnostics, report_hmm_checks,
    split_paths, take_flag, wants_help,
};
use wfsearch_engine::Decoder;
use wfsearch_engine::format::Section;
use wfsearch_engine::format::output::format_tagging;
use wfsearch_engine::format::parse_hmm;
use wfsearch_engine::validate::check_hmm;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if wants_help(&args) {
        println!("wfs-viterbi: Most probable HMM state sequence for each input line.");
        println!();
        println!("Usage: wfs-viterbi [OPTIONS] HMM INPUT [OUTPUT]");
        println!();
        println!("Every non-blank INPUT line is decoded, including lines starting");
        println!("with #. Words never seen in the emission table use the <unk> row.");
        println!("OUTPUT defaults to stdout.");
        println!();
        println!("Options:");
        println!("  --json                  Print one JSON object per line");
        println!("{SEARCH_OPTIONS_HELP}");
        return;
    }

    let (opts, mut args) = parse_search_options(&args).unwrap_or_else(|e| fatal(&e));
    let json = take_flag(&mut args, "--json");
    init_logging(opts.verbose);

    let Some((paths, output)) = split_paths(&args, 2) else {
        fatal("expected HMM INPUT [OUTPUT]; see --help");
    };
    let (hmm_path, input_path) = (&paths[0], &paths[1]);

    let parsed = parse_hmm(&read_file(hmm_path).unwrap_or_else(|e| fatal(&e)));
    for section in [
        Section::Header,
        Section::Init,
        Section::Transition,
        Section::Emission,
    ] {
        let diagnostics = parsed
            .diagnostics
            .iter()
            .filter(|(s, _)| *s == section)
            .map(|(_, d)| d);
        report_diagnostics(&format!("{hmm_path} [{section}]"), diagnostics);
    }
    report_hmm_checks(hmm_path, &check_hmm(&parsed));
    tracing::info!(
        states = parsed.hmm.num_states(),
        symbols = parsed.hmm.num_symbols(),
        "loaded {hmm_path}"
    );

    let text = read_file(input_path).unwrap_or_else(|e| fatal(&e));
    let lines = input_lines(&text);

    let decoder = Decoder::new(&parsed.hmm, opts.config);
    let outcomes = decoder.decode_lines(&lines);

    let mut out = open_output(output.as_deref()).unwrap_or_else(|e| fatal(&e));
    for (line, outcome) in lines.iter().zip(&outcomes) {
        note_exhausted(line, outcome);
        let rendered = if json {
            json_line(line, outcome)
        } else {
            format_tagging(line, outcome)
        };
        if let Err(e) = writeln!(out, "{rendered}") {
            fatal(&format!("write failed: {e}"));
        }
    }
    if let Err(e) = out.flush() {
        fatal(&format!("write failed: {e}"));
    }
}
