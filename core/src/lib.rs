//! Solstice Core Library
//!
//! Core types, traits, and abstractions for the Solstice blockchain validator.
//! This crate provides the foundation for all other Solstice components.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
