//! # Reporter Crate
//!
//! Turns a `ComparisonReport` into the numbered artifacts of one run:
//! plain-text summaries and SVG charts, written through an `ArtifactSink`.
//!
//! The assembler only sequences and labels datasets; the renderer only bins
//! and scales what it is given.

pub mod assembler;
pub mod chart;
pub mod error;
pub mod render;
pub mod sink;
pub mod text;

pub use assembler::{
    Artifact, ArtifactBody, ReportAssembler, RunContext, TIMESTAMP_FORMAT, file_name,
};
pub use chart::{Chart, ChartKind};
pub use error::ReportError;
pub use render::SvgRenderer;
pub use sink::{ArtifactSink, DirectorySink, MemorySink, publish};
