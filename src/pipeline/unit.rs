use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatch::{Dispatcher, Next};
use crate::pipeline::ChainError;

/// A handler in the request-response convention: `(request, next) -> response`
///
/// The handler may call `next` to delegate to the rest of the chain, or
/// short-circuit by returning a response directly.
pub type HandlerFn =
    Arc<dyn for<'a> Fn(Value, Next<'a>) -> Result<Value, ChainError> + Send + Sync>;

/// A handler in the accumulator convention:
/// `(request, response, next) -> response`
///
/// An existing response value is threaded through the chain; a unit that does
/// nothing forwards both values via `next.call_with(request, response)`.
pub type AccumulatorFn =
    Arc<dyn for<'a> Fn(Value, Value, Next<'a>) -> Result<Value, ChainError> + Send + Sync>;

/// The process-method calling convention.
///
/// Any type implementing this trait can sit on a chain as one unit. The
/// [`Dispatcher`](crate::Dispatcher) itself implements it, which is how
/// pipelines compose by nesting.
pub trait Process: Send + Sync {
    fn process(&self, request: Value, next: Next<'_>) -> Result<Value, ChainError>;
}

/// One entry in a middleware chain.
///
/// The descriptor is tagged once, at construction time. The dispatcher never
/// re-inspects a unit's shape dynamically: `Named` goes through the resolver,
/// every other variant passes through unchanged.
#[derive(Clone)]
pub enum Middleware {
    /// An opaque component name, resolved on demand via the chain's resolver
    Named(String),

    /// A request-response handler function
    Handler(HandlerFn),

    /// An accumulator handler function
    Accumulator(AccumulatorFn),

    /// A unit exposing the process-method convention
    Unit(Arc<dyn Process>),

    /// A nested dispatcher acting as a single unit
    Pipeline(Arc<Dispatcher>),
}

impl Middleware {
    /// Create a named descriptor to be resolved at dispatch time
    pub fn named(name: impl Into<String>) -> Self {
        Middleware::Named(name.into())
    }

    /// Wrap a request-response handler closure
    pub fn handler<F>(f: F) -> Self
    where
        F: for<'a> Fn(Value, Next<'a>) -> Result<Value, ChainError> + Send + Sync + 'static,
    {
        Middleware::Handler(Arc::new(f))
    }

    /// Wrap an accumulator handler closure
    pub fn accumulator<F>(f: F) -> Self
    where
        F: for<'a> Fn(Value, Value, Next<'a>) -> Result<Value, ChainError> + Send + Sync + 'static,
    {
        Middleware::Accumulator(Arc::new(f))
    }

    /// Wrap a process-convention unit
    pub fn unit(unit: impl Process + 'static) -> Self {
        Middleware::Unit(Arc::new(unit))
    }

    /// Wrap a dispatcher so it can sit on another chain as one unit
    pub fn pipeline(dispatcher: Dispatcher) -> Self {
        Middleware::Pipeline(Arc::new(dispatcher))
    }

    /// Human-readable description of the unit, for error diagnostics
    pub fn describe(&self) -> String {
        match self {
            Middleware::Named(name) => format!("component `{}`", name),
            Middleware::Handler(_) => "handler function".to_string(),
            Middleware::Accumulator(_) => "accumulator function".to_string(),
            Middleware::Unit(_) => "process unit".to_string(),
            Middleware::Pipeline(sub) => {
                format!("nested dispatcher ({} units)", sub.len())
            }
        }
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Middleware({})", self.describe())
    }
}

impl From<&str> for Middleware {
    fn from(name: &str) -> Self {
        Middleware::Named(name.to_string())
    }
}

impl From<String> for Middleware {
    fn from(name: String) -> Self {
        Middleware::Named(name)
    }
}

impl From<Dispatcher> for Middleware {
    fn from(dispatcher: Dispatcher) -> Self {
        Middleware::pipeline(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_named() {
        let unit = Middleware::named("auth");
        assert_eq!(unit.describe(), "component `auth`");
    }

    #[test]
    fn test_describe_handler() {
        let unit = Middleware::handler(|request, next| next.call(request));
        assert_eq!(unit.describe(), "handler function");
    }

    #[test]
    fn test_from_str() {
        let unit: Middleware = "logging".into();
        assert!(matches!(unit, Middleware::Named(ref n) if n == "logging"));
    }
}
