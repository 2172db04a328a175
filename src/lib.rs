//! bcindex - A semantic code index and hybrid retrieval server for Go repositories
//!
//! Exposes a Model Context Protocol server with five tools (`locate`,
//! `context`, `refs`, `read`, `status`) backed by an embedded SQLite store,
//! an incremental tree-sitter extractor, and a hybrid vector/keyword/graph
//! retriever.

pub mod cli;
pub mod config;
pub mod domain;
pub mod embedding;
pub mod evidence;
pub mod extractor;
pub mod indexer;
pub mod retrieval;
pub mod semantic;
pub mod server;
pub mod store;

pub use domain::error::{Error, Result};
