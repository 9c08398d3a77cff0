// wfs-morph-expand: Build a character-level transducer from a lexicon and
// class-level morphotactic rules.
//
// Usage:
//   wfs-morph-expand [-v] LEXICON RULES [OUTPUT]
//
// LEXICON holds `word class` lines. RULES is a Carmel-style file whose
// first line is the final state and whose rules look like
// `(q0 (q1 class))`; `*e*` rules become epsilon arcs.

use std::io::Write;

use wfsearch_cli::{
    fatal, init_logging, open_output, read_file, report_diagnostics, split_paths, take_flag,
    wants_help,
};
use wfsearch_engine::format::{expand, parse_lexicon, parse_morphotactics, write_pfst};

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if wants_help(&args) {
        println!("wfs-morph-expand: Expand a lexicon through morphotactic rules.");
        println!();
        println!("Usage: wfs-morph-expand [-v] LEXICON RULES [OUTPUT]");
        println!();
        println!("Writes the expanded transducer in Carmel format. OUTPUT");
        println!("defaults to stdout.");
        println!();
        println!("Options:");
        println!("  -v, --verbose           Log at debug level");
        println!("  -h, --help              Print this help");
        return;
    }

    let verbose = take_flag(&mut args, "-v") | take_flag(&mut args, "--verbose");
    init_logging(verbose);

    let Some((paths, output)) = split_paths(&args, 2) else {
        fatal("expected LEXICON RULES [OUTPUT]; see --help");
    };
    let (lexicon_path, rules_path) = (&paths[0], &paths[1]);

    let (lexicon, diagnostics) =
        parse_lexicon(&read_file(lexicon_path).unwrap_or_else(|e| fatal(&e)));
    report_diagnostics(lexicon_path, &diagnostics);

    let (rules, diagnostics) =
        parse_morphotactics(&read_file(rules_path).unwrap_or_else(|e| fatal(&e)))
            .unwrap_or_else(|e| fatal(&format!("{rules_path}: {e}")));
    report_diagnostics(rules_path, &diagnostics);

    let expansion = expand(&lexicon, &rules).unwrap_or_else(|e| fatal(&e.to_string()));
    report_diagnostics(lexicon_path, &expansion.diagnostics);
    tracing::info!(
        entries = lexicon.len(),
        states = expansion.pfst.num_states(),
        arcs = expansion.pfst.num_arcs(),
        "expanded lexicon"
    );

    let mut out = open_output(output.as_deref()).unwrap_or_else(|e| fatal(&e));
    if let Err(e) = out
        .write_all(write_pfst(&expansion.pfst).as_bytes())
        .and_then(|()| out.flush())
    {
        fatal(&format!("write failed: {e}"));
    }
}
