//! The presence synchronization and enrichment pipeline.
//!
//! One *cycle* resolves a credential ([`resolver`]), polls the buddy list
//! ([`fetcher`]), looks up context names concurrently ([`enrich`]) and turns
//! the result into display records ([`builder`]). [`scheduler`] repeats
//! cycles on a fixed interval and publishes a [`PipelineResult`].
//!
//! [`PipelineResult`]: earshot_core::view::PipelineResult

pub mod builder;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod pipeline;
pub mod resolver;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use config::PipelineConfig;
pub use error::{CycleError, ExtractionError};
pub use pipeline::{Pipeline, PollSource};
pub use scheduler::{PollHandle, PollPhase, PollScheduler};
