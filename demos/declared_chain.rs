/// Example: Build and dispatch a chain declared in JSON
///
/// Usage: cargo run --example declared_chain

use baton::{ChainConfig, MapRegistry, Middleware, Resolver};
use serde_json::json;
use std::sync::Arc;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Components live in a registry, keyed by the names the config uses.
    let registry: Arc<dyn Resolver> = Arc::new(
        MapRegistry::new()
            .with(
                "trace",
                Middleware::handler(|mut request, next| {
                    println!("→ trace: {}", request["path"]);
                    request["traced"] = json!(true);
                    next.call(request)
                }),
            )
            .with(
                "auth",
                Middleware::handler(|request, next| {
                    if request["headers"]["authorization"].is_null() {
                        // Short-circuit: the rest of the chain never runs.
                        return Ok(json!({"status": 401, "body": "unauthorized"}));
                    }
                    next.call(request)
                }),
            )
            .with(
                "respond",
                Middleware::handler(|request, _next| {
                    Ok(json!({"status": 200, "body": {"echo": request}}))
                }),
            ),
    );

    let config = ChainConfig::from_json(
        r#"{
            "middleware": ["trace", "auth", "respond"],
            "memoize": true,
            "responseSchema": {"type": "object", "required": ["status"]}
        }"#,
    )
    .expect("config parses");

    let chain = config.build(Arc::clone(&registry)).expect("chain builds");

    let authorized = json!({
        "path": "/users/42",
        "headers": {"authorization": "Bearer token"}
    });
    println!("authorized:   {}", chain.dispatch(authorized).unwrap());

    let anonymous = json!({"path": "/users/42", "headers": {}});
    println!("unauthorized: {}", chain.dispatch(anonymous).unwrap());
}
