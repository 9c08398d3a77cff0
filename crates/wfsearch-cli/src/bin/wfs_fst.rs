// wfs-fst: Decode input sequences with a probabilistic transducer.
//
// Reads a Carmel-style rule file and an input file with one sequence per
// line (tokens separated by spaces, quotes optional). Prints the most
// probable output sequence for each line.
//
// Usage:
//   wfs-fst [OPTIONS] FST INPUT [OUTPUT]
//
// Options:
//   -s, --strategy NAME   Frontier strategy: layer or best-first
//   --max-steps N         Expansion budget per sequence
//   --time-limit-ms N     Time budget per sequence
//   --log                 Print log10 probabilities
//   --json                Print one JSON object per line
//   -v, --verbose         Log at debug level
//   -h, --help            Print help

use std::io::Write;

use wfsearch_cli::{
    SEARCH_OPTIONS_HELP, commented_input_lines, fatal, init_logging, json_line, note_exhausted,
    open_output, parse_search_options, read_file, report_diagnostics, split_paths, take_flag,
    wants_help,
};
use wfsearch_engine::Decoder;
use wfsearch_engine::format::output::{format_transduction, transducer_input};
use wfsearch_engine::format::parse_pfst;
use wfsearch_engine::validate::check_pfst;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if wants_help(&args) {
        println!("wfs-fst: Transduce input sequences with a probabilistic FST.");
        println!();
        println!("Usage: wfs-fst [OPTIONS] FST INPUT [OUTPUT]");
        println!();
        println!("Each INPUT line is one sequence of input symbols. Lines starting");
        println!("with # are skipped. OUTPUT defaults to stdout.");
        println!();
        println!("Options:");
        println!("  --log                   Print log10 probabilities");
        println!("  --json                  Print one JSON object per line");
        println!("{SEARCH_OPTIONS_HELP}");
        return;
    }

    let (opts, mut args) = parse_search_options(&args).unwrap_or_else(|e| fatal(&e));
    let log = take_flag(&mut args, "--log");
    let json = take_flag(&mut args, "--json");
    init_logging(opts.verbose);

    let Some((paths, output)) = split_paths(&args, 2) else {
        fatal("expected FST INPUT [OUTPUT]; see --help");
    };
    let (fst_path, input_path) = (&paths[0], &paths[1]);

    let parsed = parse_pfst(&read_file(fst_path).unwrap_or_else(|e| fatal(&e)))
        .unwrap_or_else(|e| fatal(&format!("{fst_path}: {e}")));
    report_diagnostics(fst_path, &parsed.diagnostics);
    for warning in check_pfst(&parsed.pfst) {
        tracing::warn!("{fst_path}: {warning}");
    }
    tracing::info!(
        states = parsed.pfst.num_states(),
        arcs = parsed.pfst.num_arcs(),
        "loaded {fst_path}"
    );

    let text = read_file(input_path).unwrap_or_else(|e| fatal(&e));
    let lines = commented_input_lines(&text);
    let batch: Vec<Vec<String>> = lines.iter().map(|l| transducer_input(l)).collect();

    let decoder = Decoder::new(&parsed.pfst, opts.config);
    let outcomes = decoder.decode_batch(&batch);

    let mut out = open_output(output.as_deref()).unwrap_or_else(|e| fatal(&e));
    for (line, outcome) in lines.iter().zip(&outcomes) {
        note_exhausted(line, outcome);
        let rendered = if json {
            json_line(line, outcome)
        } else {
            format_transduction(line, outcome, log)
        };
        if let Err(e) = writeln!(out, "{rendered}") {
            fatal(&format!("write failed: {e}"));
        }
    }
    if let Err(e) = out.flush() {
        fatal(&format!("write failed: {e}"));
    }
}
