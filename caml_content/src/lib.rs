//! # CAML Content
//!
//! The content model for CAML adventure packs. This crate owns entity
//! definitions and the entity store: it knows how to find and read content
//! documents, but contains no remix or closure logic.
//!
//! ## Core Components
//!
//! - **entities**: Entity identifiers, declared types and raw document access
//! - **store**: The identifier-keyed entity store, grouped by type
//! - **error**: Load-time errors

pub mod entities;
pub mod error;
pub mod store;

pub use entities::*;
pub use error::*;
pub use store::*;
