use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::pipeline::{ChainError, Middleware};

/// Trait for resolving component names to middleware units
///
/// This trait decouples the dispatcher from any specific registry or
/// dependency-injection container. Only `Named` descriptors ever reach the
/// resolver; every other descriptor shape bypasses it unchanged.
///
/// Caching is deliberately not the resolver's responsibility. A registry is
/// re-asked on every traversal unless the owning dispatcher opted into
/// memoization, which keeps registry semantics separable from pipeline-level
/// caching.
pub trait Resolver: Send + Sync {
    /// Map a component name to an invocable middleware unit
    ///
    /// Returns [`ChainError::ResolutionFailure`] when the name is unknown.
    fn resolve(&self, name: &str) -> Result<Middleware, ChainError>;
}

/// Any `Fn(&str) -> Result<Middleware, ChainError>` closure is a resolver
impl<F> Resolver for F
where
    F: Fn(&str) -> Result<Middleware, ChainError> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Result<Middleware, ChainError> {
        self(name)
    }
}

/// A simple in-memory component registry
///
/// Names are checked with [`has`](MapRegistry::has) and fetched with
/// [`get`](MapRegistry::get); an absent name resolves to
/// [`ChainError::ResolutionFailure`].
#[derive(Clone, Default)]
pub struct MapRegistry {
    entries: HashMap<String, Middleware>,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a component under a name, consuming and returning the registry
    pub fn with(mut self, name: impl Into<String>, unit: impl Into<Middleware>) -> Self {
        self.entries.insert(name.into(), unit.into());
        self
    }

    /// Register a component under a name (mutable version)
    pub fn register(&mut self, name: impl Into<String>, unit: impl Into<Middleware>) {
        self.entries.insert(name.into(), unit.into());
    }

    /// Check whether a name is registered
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Fetch the unit registered under a name
    pub fn get(&self, name: &str) -> Option<Middleware> {
        self.entries.get(name).cloned()
    }
}

impl Resolver for MapRegistry {
    fn resolve(&self, name: &str) -> Result<Middleware, ChainError> {
        if !self.has(name) {
            return Err(ChainError::resolution_failure(name));
        }
        self.get(name)
            .ok_or_else(|| ChainError::resolution_failure(name))
    }
}

// Mock implementations for testing

/// Registry wrapper that counts resolutions per component name
///
/// Memoizing and non-memoizing dispatchers are observably different only in
/// how often they hit the registry; this wrapper makes those counts visible
/// to tests. Clones share the same counters.
#[derive(Clone)]
pub struct CountingRegistry {
    inner: MapRegistry,
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl CountingRegistry {
    pub fn new(inner: MapRegistry) -> Self {
        Self {
            inner,
            counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// How many times a name has been resolved so far
    pub fn resolutions(&self, name: &str) -> usize {
        self.counts.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

impl Resolver for CountingRegistry {
    fn resolve(&self, name: &str) -> Result<Middleware, ChainError> {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert(0) += 1;
        self.inner.resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_registry_has_and_get() {
        let registry = MapRegistry::new().with(
            "noop",
            Middleware::handler(|request, next| next.call(request)),
        );

        assert!(registry.has("noop"));
        assert!(!registry.has("missing"));
        assert!(registry.get("noop").is_some());
    }

    #[test]
    fn test_map_registry_unknown_name() {
        let registry = MapRegistry::new();
        let err = registry.resolve("auth").unwrap_err();
        assert_eq!(err, ChainError::resolution_failure("auth"));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &str| -> Result<Middleware, ChainError> {
            if name == "fixed" {
                Ok(Middleware::handler(|_request, _next| {
                    Ok(json!({"status": 200}))
                }))
            } else {
                Err(ChainError::resolution_failure(name))
            }
        };

        assert!(resolver.resolve("fixed").is_ok());
        assert!(resolver.resolve("other").is_err());
    }

    #[test]
    fn test_counting_registry() {
        let registry = CountingRegistry::new(MapRegistry::new().with(
            "noop",
            Middleware::handler(|request, next| next.call(request)),
        ));

        assert_eq!(registry.resolutions("noop"), 0);
        registry.resolve("noop").unwrap();
        registry.resolve("noop").unwrap();
        assert_eq!(registry.resolutions("noop"), 2);
    }
}
