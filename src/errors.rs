// src/errors.rs

//! Crate-wide error aliases.
//!
//! Request validation has its own structured type
//! ([`crate::session::RequestError`]); everything else flows through
//! `anyhow` with context attached at the fallible seams.

pub use anyhow::{Error, Result};
