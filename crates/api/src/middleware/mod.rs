//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. CORS (answers preflights before routing)
//! 3. `TraceLayer` (request span with method, uri, status, latency)
//! 4. Request ID (recorded into the span opened by `TraceLayer`)
//! 5. Catch panic (turns handler panics into JSON 500s)

pub mod cors;
pub mod request_id;

pub use cors::cors_layer;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
