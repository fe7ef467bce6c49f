//! Chain dispatcher
//!
//! This module contains the execution engine that turns an ordered stack of
//! middleware descriptors into a chain of continuations, built lazily one
//! index at a time as each unit decides whether to delegate onward.

pub mod traits;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::{ChainError, Middleware, Process};
use traits::Resolver;

/// The calling convention of a chain
///
/// The convention decides three things: whether an empty stack is legal at
/// construction time, what the terminal continuation does when the stack is
/// exhausted, and whether unit results are validated before propagating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Convention {
    /// Units produce the response: `(request, next) -> response`.
    ///
    /// The stack must be non-empty and some unit must return a response;
    /// running past the end is [`ChainError::UnresolvedChain`].
    #[default]
    RequestResponse,

    /// Units decorate an existing response: `(request, response, next) -> response`.
    ///
    /// An empty stack is legal; the terminal continuation returns the
    /// threaded response unchanged, so every dispatch has a well-defined
    /// result and no validation is applied.
    Accumulator,
}

impl Convention {
    fn label(self) -> &'static str {
        match self {
            Convention::RequestResponse => "request-response",
            Convention::Accumulator => "accumulator",
        }
    }
}

/// The middleware chain dispatcher
///
/// Owns an ordered stack of [`Middleware`] descriptors and an optional
/// [`Resolver`]. Each dispatch walks the stack depth-first: the continuation
/// for index `i` resolves the descriptor at `i` on demand and hands the unit
/// a continuation for `i + 1`. A unit that never calls its continuation
/// short-circuits everything after it.
///
/// A dispatcher is immutable after construction and holds no per-dispatch
/// state outside the call stack (the optional resolution cache is the one
/// exception), so a single instance behind an [`Arc`] can be dispatched
/// repeatedly and from independent flows, including while nested inside
/// another dispatcher.
pub struct Dispatcher {
    /// Unresolved middleware stack, insertion order = execution order
    stack: Vec<Middleware>,
    /// Optional component resolver for `Named` descriptors
    resolver: Option<Arc<dyn Resolver>>,
    convention: Convention,
    /// Per-index resolution cache, present only in memoizing mode
    memo: Option<Mutex<HashMap<usize, Middleware>>>,
    /// Response well-formedness check; `None` means "any JSON object"
    response_schema: Option<jsonschema::Validator>,
}

impl Dispatcher {
    /// Create a request-response chain
    ///
    /// Fails with [`ChainError::InvalidConstruction`] for an empty stack: a
    /// request-response chain with no units can never produce a response.
    pub fn new(stack: Vec<Middleware>) -> Result<Self, ChainError> {
        if stack.is_empty() {
            return Err(ChainError::invalid_construction(
                "an empty middleware stack was given",
            ));
        }
        Ok(Self::assemble(stack, Convention::RequestResponse))
    }

    /// Create an accumulator chain
    ///
    /// An empty stack is legal here: the initial response value already
    /// exists, so dispatching an empty chain is an identity pass-through.
    pub fn accumulator(stack: Vec<Middleware>) -> Self {
        Self::assemble(stack, Convention::Accumulator)
    }

    fn assemble(stack: Vec<Middleware>, convention: Convention) -> Self {
        Self {
            stack,
            resolver: None,
            convention,
            memo: None,
            response_schema: None,
        }
    }

    /// Attach a resolver for `Named` descriptors
    pub fn with_resolver<R: Resolver + 'static>(self, resolver: R) -> Self {
        self.with_resolver_arc(Arc::new(resolver))
    }

    /// Attach an already-shared resolver
    pub fn with_resolver_arc(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Resolve each descriptor at most once for the lifetime of this instance
    ///
    /// Without this, every traversal re-asks the resolver for every `Named`
    /// descriptor it reaches, which keeps registry semantics intact at the
    /// cost of one resolver call per unit per dispatch.
    pub fn memoized(mut self) -> Self {
        self.memo = Some(Mutex::new(HashMap::new()));
        self
    }

    /// Tighten the response well-formedness check with a JSON Schema
    ///
    /// Without a schema, any JSON object counts as a well-formed response.
    pub fn with_response_schema(mut self, schema: &Value) -> Result<Self, ChainError> {
        let validator = jsonschema::validator_for(schema).map_err(|e| {
            ChainError::invalid_construction(format!("failed to compile response schema: {}", e))
        })?;
        self.response_schema = Some(validator);
        Ok(self)
    }

    /// Number of units on the stack
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    /// Dispatch a request through a request-response chain
    ///
    /// Builds the continuation for index 0, invokes it, and returns its
    /// result. Errors propagate synchronously; nothing is caught or retried.
    pub fn dispatch(&self, request: Value) -> Result<Value, ChainError> {
        if self.convention != Convention::RequestResponse {
            return Err(ChainError::custom(
                "dispatch requires a request-response chain; use dispatch_with for accumulator chains",
            ));
        }
        tracing::debug!(units = self.stack.len(), "dispatching middleware chain");
        self.entry().call(request)
    }

    /// Dispatch a request and an initial response through an accumulator chain
    ///
    /// The response is threaded through every unit; an empty chain returns it
    /// unchanged.
    pub fn dispatch_with(&self, request: Value, response: Value) -> Result<Value, ChainError> {
        if self.convention != Convention::Accumulator {
            return Err(ChainError::custom(
                "dispatch_with requires an accumulator chain; use dispatch for request-response chains",
            ));
        }
        tracing::debug!(units = self.stack.len(), "dispatching accumulator chain");
        self.entry().call_with(request, response)
    }

    fn entry(&self) -> Next<'_> {
        Next {
            chain: self,
            index: 0,
            tail: Tail::Exhausted,
        }
    }

    /// Run this chain as one unit of an outer chain
    ///
    /// The nested run sees a virtual extended view of the stack: its terminal
    /// continuation forwards to `outer` instead of signaling exhaustion. The
    /// stack itself is never touched, so nested invocation is idempotent and
    /// needs no synchronization.
    fn run_nested<'a>(
        &'a self,
        request: Value,
        response: Option<Value>,
        outer: Next<'a>,
    ) -> Result<Value, ChainError> {
        let first = Next {
            chain: self,
            index: 0,
            tail: Tail::Outer(&outer),
        };
        first.invoke(request, response)
    }

    /// Resolve the descriptor at `index` into an invocable unit
    ///
    /// Non-`Named` descriptors pass through unchanged; resolution is a pure
    /// opaque-name-lookup step, not a generic transform. In memoizing mode
    /// the resolved unit is cached per index for the lifetime of this
    /// instance.
    fn resolved(&self, index: usize, descriptor: &Middleware) -> Result<Middleware, ChainError> {
        let Some(memo) = &self.memo else {
            return self.resolve_descriptor(descriptor);
        };
        if let Some(unit) = memo.lock().unwrap().get(&index) {
            return Ok(unit.clone());
        }
        // The lock is not held across the resolver call.
        let unit = self.resolve_descriptor(descriptor)?;
        memo.lock().unwrap().insert(index, unit.clone());
        Ok(unit)
    }

    fn resolve_descriptor(&self, descriptor: &Middleware) -> Result<Middleware, ChainError> {
        match descriptor {
            Middleware::Named(name) => {
                tracing::debug!(name = %name, "resolving middleware component");
                let resolver = self
                    .resolver
                    .as_ref()
                    .ok_or_else(|| ChainError::resolution_failure(name.clone()))?;
                let unit = resolver.resolve(name)?;
                if matches!(unit, Middleware::Named(_)) {
                    return Err(ChainError::unsupported_unit(
                        unit.describe(),
                        self.convention.label(),
                    ));
                }
                Ok(unit)
            }
            other => Ok(other.clone()),
        }
    }

    /// Check that a unit's result is a well-formed response
    fn check_response(&self, value: Value, unit: &Middleware) -> Result<Value, ChainError> {
        let well_formed = match &self.response_schema {
            Some(validator) => validator.is_valid(&value),
            None => value.is_object(),
        };
        if well_formed {
            Ok(value)
        } else {
            Err(ChainError::unexpected_result(
                describe_value(&value),
                unit.describe(),
            ))
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("units", &self.stack.len())
            .field("convention", &self.convention)
            .field("memoized", &self.memo.is_some())
            .finish()
    }
}

/// A dispatcher is itself a process-convention unit, so chains nest
impl Process for Dispatcher {
    fn process(&self, request: Value, next: Next<'_>) -> Result<Value, ChainError> {
        if self.convention != Convention::RequestResponse {
            return Err(ChainError::unsupported_unit(
                "accumulator dispatcher",
                Convention::RequestResponse.label(),
            ));
        }
        self.run_nested(request, None, next)
    }
}

/// What the continuation does when the stack runs out
#[derive(Clone, Copy)]
enum Tail<'a> {
    /// Top-level chain: exhaustion is terminal
    Exhausted,
    /// Nested chain: forward to the outer chain's continuation
    Outer(&'a Next<'a>),
}

/// The rest of the chain, starting at one index
///
/// Ephemeral and single-use: a unit receives the continuation for the index
/// after its own, and consumes it by calling it. Holds only the owning
/// dispatcher, the index, and the terminal behavior; there is no captured
/// mutable state anywhere in a traversal.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a Dispatcher,
    index: usize,
    tail: Tail<'a>,
}

impl<'a> Next<'a> {
    /// Run the remaining chain (request-response convention)
    pub fn call(self, request: Value) -> Result<Value, ChainError> {
        self.invoke(request, None)
    }

    /// Run the remaining chain, threading a response (accumulator convention)
    pub fn call_with(self, request: Value, response: Value) -> Result<Value, ChainError> {
        self.invoke(request, Some(response))
    }

    fn invoke(self, request: Value, response: Option<Value>) -> Result<Value, ChainError> {
        let chain = self.chain;

        let Some(descriptor) = chain.stack.get(self.index) else {
            return self.terminal(request, response);
        };

        let unit = chain.resolved(self.index, descriptor)?;
        tracing::trace!(index = self.index, unit = %unit.describe(), "invoking middleware unit");

        let next = Next {
            chain,
            index: self.index + 1,
            tail: self.tail,
        };

        let result = match (&unit, chain.convention) {
            (Middleware::Pipeline(sub), convention) => {
                if sub.convention != convention {
                    return Err(ChainError::unsupported_unit(
                        unit.describe(),
                        convention.label(),
                    ));
                }
                sub.run_nested(request, response, next)
            }
            (Middleware::Unit(unit), Convention::RequestResponse) => unit.process(request, next),
            (Middleware::Handler(handler), Convention::RequestResponse) => handler(request, next),
            (Middleware::Accumulator(handler), Convention::Accumulator) => {
                let response = response.ok_or_else(|| {
                    ChainError::custom("accumulator chain invoked without a response value")
                })?;
                handler(request, response, next)
            }
            _ => {
                return Err(ChainError::unsupported_unit(
                    unit.describe(),
                    chain.convention.label(),
                ));
            }
        }?;

        match chain.convention {
            Convention::RequestResponse => chain.check_response(result, descriptor),
            Convention::Accumulator => Ok(result),
        }
    }

    fn terminal(self, request: Value, response: Option<Value>) -> Result<Value, ChainError> {
        match self.tail {
            Tail::Outer(outer) => outer.invoke(request, response),
            Tail::Exhausted => match self.chain.convention {
                Convention::Accumulator => response.ok_or_else(|| {
                    ChainError::custom("accumulator chain invoked without a response value")
                }),
                Convention::RequestResponse => Err(ChainError::UnresolvedChain),
            },
        }
    }
}

/// Describe a value for error messages: its JSON type and a short rendering
fn describe_value(value: &Value) -> String {
    let rendered = value.to_string();
    let rendered: String = if rendered.chars().count() > 60 {
        let mut truncated: String = rendered.chars().take(60).collect();
        truncated.push_str("...");
        truncated
    } else {
        rendered
    };
    format!("{} ({})", type_name(value), rendered)
}

/// Get the type name of a value for error messages
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
