//! Text ingest and reporting around the counting pipeline.
//!
//! - [`edge_list`]: read a whitespace-separated edge list, interning vertex
//!   names into dense ids.
//! - [`report`]: write a [`FinalReport`](crate::algs::FinalReport) in the
//!   tab-separated result format.

pub mod edge_list;
pub mod report;

pub use edge_list::{NamedGraph, read_edge_list};
pub use report::write_report;
