use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::dispatch::traits::Resolver;
use crate::dispatch::{Convention, Dispatcher};
use crate::pipeline::{ChainError, Middleware};

/// Declarative chain definition
///
/// A chain is declared as an ordered list of component names, resolved
/// against a registry when the chain is built. Example:
///
/// ```json
/// {
///   "middleware": ["trace", "auth", "router"],
///   "convention": "requestResponse",
///   "memoize": true,
///   "responseSchema": {"type": "object", "required": ["status"]}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Ordered component names, insertion order = execution order
    #[serde(default)]
    pub middleware: Vec<String>,

    /// Calling convention (defaults to request-response)
    #[serde(default)]
    pub convention: Convention,

    /// Resolve each component at most once per built dispatcher
    #[serde(default)]
    pub memoize: bool,

    /// Optional JSON Schema tightening the response well-formedness check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl ChainConfig {
    /// Parse a chain definition from a JSON string
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Build a dispatcher from this definition
    ///
    /// Applies the same construction-time checks as the programmatic API: an
    /// empty request-response chain is [`ChainError::InvalidConstruction`],
    /// unknown component names surface only when dispatch reaches them.
    pub fn build(&self, resolver: Arc<dyn Resolver>) -> Result<Dispatcher, ChainError> {
        let stack: Vec<Middleware> = self
            .middleware
            .iter()
            .map(|name| Middleware::named(name.as_str()))
            .collect();

        let mut dispatcher = match self.convention {
            Convention::RequestResponse => Dispatcher::new(stack)?,
            Convention::Accumulator => Dispatcher::accumulator(stack),
        }
        .with_resolver_arc(resolver);

        if self.memoize {
            dispatcher = dispatcher.memoized();
        }
        if let Some(schema) = &self.response_schema {
            dispatcher = dispatcher.with_response_schema(schema)?;
        }

        Ok(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::traits::MapRegistry;
    use serde_json::json;

    fn registry() -> Arc<dyn Resolver> {
        Arc::new(
            MapRegistry::new()
                .with(
                    "trace",
                    Middleware::handler(|mut request, next| {
                        request["traced"] = json!(true);
                        next.call(request)
                    }),
                )
                .with(
                    "respond",
                    Middleware::handler(|_request, _next| Ok(json!({"status": 200}))),
                ),
        )
    }

    #[test]
    fn test_parse_chain_config() {
        let config = ChainConfig::from_json(
            r#"{
                "middleware": ["trace", "respond"],
                "memoize": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.middleware, vec!["trace", "respond"]);
        assert_eq!(config.convention, Convention::RequestResponse);
        assert!(config.memoize);
        assert!(config.response_schema.is_none());
    }

    #[test]
    fn test_parse_accumulator_convention() {
        let config = ChainConfig::from_json(r#"{"convention": "accumulator"}"#).unwrap();
        assert_eq!(config.convention, Convention::Accumulator);
        assert!(config.middleware.is_empty());
    }

    #[test]
    fn test_build_and_dispatch() {
        let config = ChainConfig::from_json(r#"{"middleware": ["trace", "respond"]}"#).unwrap();
        let chain = config.build(registry()).unwrap();

        let response = chain.dispatch(json!({"path": "/"})).unwrap();
        assert_eq!(response, json!({"status": 200}));
    }

    #[test]
    fn test_build_empty_request_response_chain_fails() {
        let config = ChainConfig::from_json(r#"{"middleware": []}"#).unwrap();
        let err = config.build(registry()).unwrap_err();
        assert!(matches!(err, ChainError::InvalidConstruction { .. }));
    }

    #[test]
    fn test_build_applies_response_schema() {
        let config = ChainConfig::from_json(
            r#"{
                "middleware": ["respond"],
                "responseSchema": {"type": "object", "required": ["body"]}
            }"#,
        )
        .unwrap();

        let chain = config.build(registry()).unwrap();
        let err = chain.dispatch(json!({})).unwrap_err();
        assert!(matches!(err, ChainError::UnexpectedResult { .. }));
    }
}
