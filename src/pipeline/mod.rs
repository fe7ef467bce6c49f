//! Chain data model
//!
//! This module contains the types that describe a middleware chain before it
//! runs: the tagged unit descriptor and the error type shared by construction
//! and dispatch.

mod error;
mod unit;

pub use error::ChainError;
pub use unit::{AccumulatorFn, HandlerFn, Middleware, Process};
