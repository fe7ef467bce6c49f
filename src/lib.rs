//! baton - a composable middleware chain dispatcher
//!
//! This library threads an opaque request value through an ordered stack of
//! middleware units, each of which may delegate to the rest of the chain or
//! short-circuit with a response. Units can be closures, process-convention
//! types, nested dispatchers, or opaque names resolved on demand through a
//! pluggable registry.

pub mod config;
pub mod dispatch;
pub mod pipeline;

// Re-export commonly used types
pub use config::ChainConfig;
pub use dispatch::traits::{MapRegistry, Resolver};
pub use dispatch::{Convention, Dispatcher, Next};
pub use pipeline::{AccumulatorFn, ChainError, HandlerFn, Middleware, Process};
