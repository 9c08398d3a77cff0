// wfs-check-hmm: Check an HMM parameter file.
//
// Compares the header counts with what the file actually contains and
// reports probability tables that do not sum to one.
//
// Usage:
//   wfs-check-hmm [-v] HMM

use wfsearch_cli::{fatal, init_logging, read_file, report_diagnostics, take_flag, wants_help};
use wfsearch_engine::format::parse_hmm;
use wfsearch_engine::validate::check_hmm;

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    if wants_help(&args) {
        println!("wfs-check-hmm: Validate an HMM parameter file.");
        println!();
        println!("Usage: wfs-check-hmm [-v] HMM");
        println!();
        println!("Prints field=value for each header count that matches the file,");
        println!("and a warning line for each mismatch or bad probability sum.");
        println!();
        println!("Options:");
        println!("  -v, --verbose           Log at debug level");
        println!("  -h, --help              Print this help");
        return;
    }

    let verbose = take_flag(&mut args, "-v") | take_flag(&mut args, "--verbose");
    init_logging(verbose);

    let [path] = args.as_slice() else {
        fatal("expected exactly one HMM file; see --help");
    };

    let parsed = parse_hmm(&read_file(path).unwrap_or_else(|e| fatal(&e)));
    report_diagnostics(path, parsed.diagnostics.iter().map(|(_, d)| d));
    print!("{}", check_hmm(&parsed));
}
