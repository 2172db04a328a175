//! # Domain Layer
//!
//! Core types and errors shared by every subsystem (store, extractor,
//! semantic generator, indexer, retriever, evidence builder). Contains no
//! I/O of its own.

pub mod error;
pub mod ports;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
