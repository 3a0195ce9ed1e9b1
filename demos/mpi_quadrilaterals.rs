// Counts 4-cycles across MPI ranks. Rank 0 reads the edge list and
// broadcasts it; every rank then runs the pipeline and rank 0 prints the
// report.
//
//     mpirun -n 4 target/debug/examples/mpi_quadrilaterals input.txt
use std::fs::File;
use std::io::BufReader;

use quad_sieve::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let comm = MpiComm::new().ok_or("MPI was already initialized")?;
    let cfg = PipelineConfig::default();

    let named = if comm.rank() == cfg.root {
        let path = std::env::args().nth(1).unwrap_or_else(|| "input.txt".into());
        Some(read_edge_list(BufReader::new(File::open(path)?))?)
    } else {
        None
    };

    let snapshot = named.as_ref().map(|g| g.snapshot.clone());
    if let Some(report) = broadcast_and_count(&comm, snapshot, &cfg)? {
        let names = named.map(|g| g.names).unwrap_or_default();
        write_report(std::io::stdout().lock(), &report, &names)?;
    }
    Ok(())
}
