#![doc = "trending-digest-core: scrape, enrich, generate and deliver a trending-projects digest."]

//! Core library for trending-digest. Holds the data model, the backend
//! contracts and every pipeline stage; the CLI crate supplies concrete
//! generation and mail clients and wires them into [`pipeline::run_digest`].
//!
//! # Usage
//! Depend on this crate for anything that needs the pipeline or its types.
//! With the default `test-export-mocks` feature the `Mock*` backends from
//! [`contract`] are available to downstream tests.

pub mod config;
pub mod contract;
pub mod deliver;
pub mod detail;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod format;
pub mod generate;
pub mod listing;
pub mod pipeline;
pub mod stats;
pub mod template;

pub use config::DigestConfig;
pub use error::{DigestError, PipelineError};
pub use pipeline::{preview, run_digest, DigestReport, Preview, Stage};
