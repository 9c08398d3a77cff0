// wfs-conv-format: Convert tagger output to annotated text.
//
// Reads `wfs-viterbi` output lines from stdin and writes `word/tag` lines
// to stdout. Lines without a path come out empty so the output stays
// aligned with the input.
//
// Usage:
//   wfs-conv-format < tagged.txt > annotated.txt

use std::io::{self, BufRead, Write};

use wfsearch_cli::{fatal, init_logging, take_flag, wants_help};
use wfsearch_engine::format::output::tagged_to_annotated;

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if wants_help(&args) {
        println!("wfs-conv-format: Turn tagger output into word/tag lines.");
        println!();
        println!("Usage: wfs-conv-format [-v] < TAGGED > ANNOTATED");
        println!();
        println!("Options:");
        println!("  -v, --verbose           Log at debug level");
        println!("  -h, --help              Print this help");
        return;
    }

    let verbose = take_flag(&mut args, "-v") | take_flag(&mut args, "--verbose");
    init_logging(verbose);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for (n, line) in stdin.lock().lines().enumerate() {
        let line = line.unwrap_or_else(|e| fatal(&format!("error reading stdin: {e}")));
        let annotated = tagged_to_annotated(&line).unwrap_or_else(|| {
            tracing::warn!("line {}: no tagging to convert", n + 1);
            String::new()
        });
        if let Err(e) = writeln!(out, "{annotated}") {
            fatal(&format!("write failed: {e}"));
        }
    }
    if let Err(e) = out.flush() {
        fatal(&format!("write failed: {e}"));
    }
}
