//! Core types and trait definitions for earshot.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the presence data model, the credential-store and host-bridge
//! abstractions, and the small URI helpers every other crate shares.

// Trait methods are declared with explicit `Send` futures and implemented
// with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod credential;
pub mod error;
pub mod host;
pub mod presence;
pub mod store;
pub mod uri;
pub mod view;

pub use error::{Error, Result};
