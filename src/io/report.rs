//! Tab-separated result report.
//!
//! ```text
//!
//! ========== FINAL RESULTS ==========
//! Global_Count	4-Cycles	1
//! Per-Vertex_Count	a	1
//! ...
//! ===================================
//! ```

use std::io::Write;

use crate::algs::quadrilaterals::FinalReport;
use crate::quad_error::QuadError;

pub const REPORT_HEADER: &str = "========== FINAL RESULTS ==========";
pub const REPORT_FOOTER: &str = "===================================";

/// Write `report` to `out`. `names[id]` labels vertex `id`; ids without a
/// name are printed as numbers.
pub fn write_report<W: Write>(
    mut out: W,
    report: &FinalReport,
    names: &[String],
) -> Result<(), QuadError> {
    writeln!(out)?;
    writeln!(out, "{REPORT_HEADER}")?;
    writeln!(out, "Global_Count\t4-Cycles\t{}", report.global_count)?;
    for &(v, count) in &report.per_vertex {
        match names.get(v as usize) {
            Some(name) => writeln!(out, "Per-Vertex_Count\t{name}\t{count}")?,
            None => writeln!(out, "Per-Vertex_Count\t{v}\t{count}")?,
        }
    }
    writeln!(out, "{REPORT_FOOTER}")?;
    out.flush()?;
    Ok(())
}
