//! Notebook persistence for hexnote.
//!
//! A [`Notebook`] pairs the location of a binary with the annotation tree
//! built on it. [`NotebookStorage`] writes notebooks as JSON documents and
//! reads them back, rebuilding leaf interpreters through an
//! [`InterpreterRegistry`](hexnote_interp::InterpreterRegistry).
//!
//! # Modules
//!
//! - [`notebook`] — The [`Notebook`] value
//! - [`storage`] — [`NotebookStorage`] read/write
//! - [`document`] — Serde types of the persisted document
//! - [`config`] — [`StorageConfig`]

pub mod config;
pub mod document;
pub mod error;
pub mod notebook;
pub mod storage;

pub use config::StorageConfig;
pub use document::{Document, InterpreterDoc, NodeDoc, NodeKind, FORMAT_VERSION};
pub use error::{NotebookError, NotebookResult};
pub use notebook::Notebook;
pub use storage::NotebookStorage;
