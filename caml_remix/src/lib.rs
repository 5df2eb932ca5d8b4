//! # CAML Remix
//!
//! Builds playable remix packs out of CAML adventure content. Given a few
//! target encounters, the closure engine pulls in everything needed to make
//! their gates satisfiable, then the emitter writes the result as a new pack.
//!
//! ## Core Components
//!
//! - **gates**: Requirement and outcome extraction from encounter documents
//! - **producers**: Reverse index from tags to the encounters that add them
//! - **closure**: The fixed-point closure over targets, with inclusion provenance
//! - **emitter**: Pack layout and the synthesized module descriptor
//! - **remix**: Seeded target selection and end-to-end runs
//! - **catalog**, **graph**, **validate**: Pack tooling over a single content root
//!
//! ## Design Philosophy
//!
//! - **Optimistic**: Tags with no producer are granted at the start instead of failing the remix
//! - **Monotone**: Closure only ever adds entities, tags and items, so it always terminates
//! - **Deterministic**: Same content, seed and pick always yield the same pack

pub mod catalog;
pub mod closure;
pub mod config;
pub mod emitter;
pub mod error;
pub mod gates;
pub mod graph;
pub mod producers;
pub mod remix;
pub mod validate;

pub use catalog::Catalog;
pub use closure::*;
pub use config::RemixConfig;
pub use emitter::*;
pub use error::*;
pub use gates::*;
pub use graph::GateGraph;
pub use producers::ProducerIndex;
pub use remix::*;
pub use validate::{validate, Severity, ValidationIssue, ValidationReport};
