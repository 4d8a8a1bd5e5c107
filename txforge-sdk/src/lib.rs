#![deny(missing_docs)]

//! txforge SDK - Complete SDK.
//!
//! Re-exports all txforge components for convenient single-crate usage.

pub use txforge_primitives as primitives;
pub use txforge_script as script;
pub use txforge_transaction as transaction;
pub use txforge_builder as builder;
