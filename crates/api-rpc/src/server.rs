//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP on a TCP address (localhost by default).

use crate::error::invalid_params;
use crate::handler::{RpcHandler, RpcResult};
use crate::rate_limiter::RateLimitConfig;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::{ErrorObjectOwned, Params};
use jsonrpsee::RpcModule;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use walkin_core::application::QueueEngine;

pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9610;

/// Method names
pub mod methods {
    pub const PROVIDER_LIST: &str = "provider.list.v1";
    pub const PROVIDER_CREATE: &str = "provider.create.v1";
    pub const PROVIDER_SET_ACTIVE: &str = "provider.set_active.v1";
    pub const PROVIDER_REMOVE: &str = "provider.remove.v1";
    pub const TICKET_REGISTER: &str = "ticket.register.v1";
    pub const TICKET_COMPLETE: &str = "ticket.complete.v1";
    pub const TICKET_CANCEL: &str = "ticket.cancel.v1";
    pub const TICKET_GET: &str = "ticket.get.v1";
    pub const TICKET_FIND: &str = "ticket.find.v1";
    pub const QUEUE_CALL_NEXT: &str = "queue.call_next.v1";
    pub const QUEUE_SNAPSHOT: &str = "queue.snapshot.v1";
    pub const ADMIN_STATUS: &str = "admin.status.v1";
    pub const REPORT_STATS: &str = "report.stats.v1";
    pub const REPORT_DAILY: &str = "report.daily.v1";
    pub const REPORT_HISTORY: &str = "report.history.v1";
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to register method: {0}")]
    Register(String),
}

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 picks an ephemeral port
    pub port: u16,
    pub rate_limit: RateLimitConfig,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// A started server
pub struct RunningServer {
    pub handle: ServerHandle,
    pub local_addr: SocketAddr,
}

impl RunningServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Request shutdown and wait until the server has stopped
    pub async fn stop(self) {
        // Already stopped is fine
        let _ = self.handle.stop();
        self.handle.stopped().await;
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    engine: Arc<QueueEngine>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, engine: Arc<QueueEngine>) -> Self {
        Self { config, engine }
    }

    /// Bind and start serving every method
    pub async fn start(self) -> Result<RunningServer, ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = server
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let module = build_module(RpcHandler::new(self.engine, self.config.rate_limit))?;
        let handle = server.start(module);

        info!(
            %local_addr,
            burst = self.config.rate_limit.burst,
            per_second = self.config.rate_limit.per_second,
            "JSON-RPC server started"
        );
        Ok(RunningServer { handle, local_addr })
    }
}

/// Register every method on a module whose context is `handler`
pub fn build_module(handler: RpcHandler) -> Result<RpcModule<RpcHandler>, ServerError> {
    use methods::*;

    let mut module = RpcModule::new(handler);

    register_plain(&mut module, PROVIDER_LIST, RpcHandler::list_providers)?;
    register(&mut module, PROVIDER_CREATE, RpcHandler::create_provider)?;
    register(&mut module, PROVIDER_SET_ACTIVE, RpcHandler::set_provider_active)?;
    register(&mut module, PROVIDER_REMOVE, RpcHandler::remove_provider)?;

    register(&mut module, TICKET_REGISTER, RpcHandler::register_ticket)?;
    register(&mut module, TICKET_COMPLETE, RpcHandler::complete_ticket)?;
    register(&mut module, TICKET_CANCEL, RpcHandler::cancel_ticket)?;
    register(&mut module, TICKET_GET, RpcHandler::get_ticket)?;
    register(&mut module, TICKET_FIND, RpcHandler::find_ticket)?;

    register(&mut module, QUEUE_CALL_NEXT, RpcHandler::call_next)?;
    register_optional(&mut module, QUEUE_SNAPSHOT, RpcHandler::snapshot)?;

    register_plain(&mut module, ADMIN_STATUS, RpcHandler::status)?;
    register_optional(&mut module, REPORT_STATS, RpcHandler::stats)?;
    register_plain(&mut module, REPORT_DAILY, RpcHandler::daily)?;
    register_optional(&mut module, REPORT_HISTORY, RpcHandler::history)?;

    Ok(module)
}

/// Method taking a required parameter object
fn register<P, R, F>(
    module: &mut RpcModule<RpcHandler>,
    name: &'static str,
    call: F,
) -> Result<(), ServerError>
where
    P: DeserializeOwned,
    R: Serialize + Clone + Send + 'static,
    F: Fn(&RpcHandler, P) -> RpcResult<R> + Clone + Send + Sync + 'static,
{
    module
        .register_method(name, move |params, handler, _| {
            let req: P = params.parse().map_err(invalid_params)?;
            call(handler, req)
        })
        .map_err(|e| ServerError::Register(e.to_string()))?;
    Ok(())
}

/// Method whose parameter object may be omitted entirely
fn register_optional<P, R, F>(
    module: &mut RpcModule<RpcHandler>,
    name: &'static str,
    call: F,
) -> Result<(), ServerError>
where
    P: DeserializeOwned + Default,
    R: Serialize + Clone + Send + 'static,
    F: Fn(&RpcHandler, P) -> RpcResult<R> + Clone + Send + Sync + 'static,
{
    module
        .register_method(name, move |params, handler, _| {
            let req: P = parse_or_default(&params)?;
            call(handler, req)
        })
        .map_err(|e| ServerError::Register(e.to_string()))?;
    Ok(())
}

/// Method without parameters; anything sent is ignored
fn register_plain<R, F>(
    module: &mut RpcModule<RpcHandler>,
    name: &'static str,
    call: F,
) -> Result<(), ServerError>
where
    R: Serialize + Clone + Send + 'static,
    F: Fn(&RpcHandler) -> RpcResult<R> + Clone + Send + Sync + 'static,
{
    module
        .register_method(name, move |_, handler, _| call(handler))
        .map_err(|e| ServerError::Register(e.to_string()))?;
    Ok(())
}

fn parse_or_default<P: DeserializeOwned + Default>(params: &Params) -> Result<P, ErrorObjectOwned> {
    match params.as_str().map(str::trim) {
        None | Some("") | Some("null") | Some("[]") => Ok(P::default()),
        Some(_) => params.parse().map_err(invalid_params),
    }
}

