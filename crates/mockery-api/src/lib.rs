//! mockery-api: configuration-driven HTTP mock server.
//!
//! Routes are declared in a JSON config file as (method, path pattern,
//! auth requirement, canned response). Incoming requests are answered from
//! that table without contacting any backend.
//!
//! ```json
//! {
//!   "server": { "port": 8080 },
//!   "routes": [
//!     {
//!       "path": "/api/products/{id}",
//!       "method": "GET",
//!       "requiresAuth": true,
//!       "authHeader": "Authorization",
//!       "response": { "status": 200, "body": { "name": "Widget" } }
//!     }
//!   ]
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod endpoints;
pub mod health;
pub mod server;

pub use config::{ConfigError, MockConfig};
pub use dispatch::{DispatchEngine, Outcome};
