//! Configuration types for baton
//!
//! This module contains types for parsing and representing declarative JSON
//! chain definitions.

mod chain;

pub use chain::ChainConfig;
