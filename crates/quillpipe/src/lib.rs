//! `quillpipe` crate (library surface).
//!
//! The primary entrypoint for end users is the `quillpipe` binary. The library
//! exposes the pipeline stages so embedders and the contract tests can drive
//! them against their own backends.

pub mod filter;
pub mod pipeline;
pub mod planner;
pub mod report;

pub use pipeline::{Pipeline, PipelineEvent};
pub use quillpipe_core as core;
