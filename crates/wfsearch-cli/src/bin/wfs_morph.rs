// wfs-morph: Morphological analysis with a character-level transducer.
//
// Each word of the word list is split into characters and decoded; the
// outputs of the best path form the analysis, e.g.
// `speaks => speak/irreg_verb_stem s/3sg`.
//
// Usage:
//   wfs-morph [OPTIONS] [--accept-only] FST WORDLIST [OUTPUT]
//
// Options:
//   --accept-only         Only say whether each word is accepted
//   --json                Print one JSON object per word
//   -s, --strategy NAME   Frontier strategy: layer or best-first
//   -v, --verbose         Log at debug level
//   -h, --help            Print help

use std::io::Write;

use wfsearch_cli::{
    SEARCH_OPTIONS_HELP, commented_input_lines, fatal, init_logging, json_line, note_exhausted,
    open_output, parse_search_options, read_file, report_diagnostics, split_paths, take_flag,
    wants_help,
};
use wfsearch_engine::Decoder;
use wfsearch_engine::format::output::{format_acceptance, format_morph, word_chars};
use wfsearch_engine::format::parse_pfst;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if wants_help(&args) {
        println!("wfs-morph: Analyse words with a character-level transducer.");
        println!();
        println!("Usage: wfs-morph [OPTIONS] [--accept-only] FST WORDLIST [OUTPUT]");
        println!();
        println!("WORDLIST holds one word per line. OUTPUT defaults to stdout.");
        println!();
        println!("Options:");
        println!("  --accept-only           Print yes/no instead of the analysis");
        println!("  --json                  Print one JSON object per word");
        println!("{SEARCH_OPTIONS_HELP}");
        return;
    }

    let (opts, mut args) = parse_search_options(&args).unwrap_or_else(|e| fatal(&e));
    let accept_only = take_flag(&mut args, "--accept-only");
    let json = take_flag(&mut args, "--json");
    init_logging(opts.verbose);

    let Some((paths, output)) = split_paths(&args, 2) else {
        fatal("expected FST WORDLIST [OUTPUT]; see --help");
    };
    let (fst_path, words_path) = (&paths[0], &paths[1]);

    let parsed = parse_pfst(&read_file(fst_path).unwrap_or_else(|e| fatal(&e)))
        .unwrap_or_else(|e| fatal(&format!("{fst_path}: {e}")));
    report_diagnostics(fst_path, &parsed.diagnostics);

    let text = read_file(words_path).unwrap_or_else(|e| fatal(&e));
    let words = commented_input_lines(&text);
    let batch: Vec<Vec<String>> = words.iter().map(|w| word_chars(w)).collect();

    let decoder = Decoder::new(&parsed.pfst, opts.config);
    let outcomes = decoder.decode_batch(&batch);

    let mut out = open_output(output.as_deref()).unwrap_or_else(|e| fatal(&e));
    for (word, outcome) in words.iter().zip(&outcomes) {
        note_exhausted(word, outcome);
        let rendered = if json {
            json_line(word, outcome)
        } else if accept_only {
            format_acceptance(word, outcome)
        } else {
            format_morph(word, outcome)
        };
        if let Err(e) = writeln!(out, "{rendered}") {
            fatal(&format!("write failed: {e}"));
        }
    }
    if let Err(e) = out.flush() {
        fatal(&format!("write failed: {e}"));
    }
}
