// Counts 4-cycles in an edge-list file using worker threads in one process.
//
//     cargo run --example threaded_quadrilaterals -- input.txt 4
//
// Without a path a small built-in graph is used. The report is written to
// stdout in the tab-separated result format.
use std::fs::File;
use std::io::BufReader;

use quad_sieve::prelude::*;

const SAMPLE: &str = "\
alice bob
bob carol
carol dave
dave alice
alice carol
erin bob
erin dave
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let graph = match args.next() {
        Some(path) => read_edge_list(BufReader::new(File::open(path)?))?,
        None => read_edge_list(SAMPLE.as_bytes())?,
    };
    let workers = args.next().map(|w| w.parse()).transpose()?.unwrap_or(4);

    eprintln!(
        "{} vertices, {} edges, {workers} workers",
        graph.snapshot.vertex_count,
        graph.snapshot.edge_count()
    );
    let report = run_local(workers, &graph.snapshot, &PipelineConfig::default())?;
    write_report(std::io::stdout().lock(), &report, &graph.names)?;
    Ok(())
}
