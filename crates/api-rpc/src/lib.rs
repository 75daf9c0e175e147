//! JSON-RPC API Layer
//!
//! Exposes the queue engine as JSON-RPC 2.0 methods (`<area>.<action>.v1`).

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use server::{build_module, methods, RpcServer, RpcServerConfig, RunningServer, ServerError};
