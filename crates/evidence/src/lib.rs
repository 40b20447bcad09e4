//! # finctx Evidence
//!
//! Builds an [`EvidencePackage`](finctx_core::EvidencePackage) for one tool
//! invocation: which table and row each fact came from, the aggregates
//! computed over the records, where the data flowed from, and a coarse
//! confidence score.
//!
//! Evidence is best-effort. [`build_evidence`] never fails; internal
//! errors collapse into an empty package with zero confidence.

pub mod builder;
pub mod lineage;

pub use builder::{EvidenceBuilder, build_evidence, try_build_evidence};
pub use lineage::derive_lineage;
