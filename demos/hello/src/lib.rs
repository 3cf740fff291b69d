//! Demo package for doroute.
//!
//! `doroute serve --root demos/hello` serves:
//!
//! ```text
//! GET  /ping     -> hello::ping::hello
//! POST /echo     -> hello::ping::echo
//! GET  /health   -> hello::health
//! ```

pub mod ping;

/// Liveness probe. The path is derived from the function name.
///
/// do:api
pub async fn health() -> &'static str {
    "ok"
}
