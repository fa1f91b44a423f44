//! JSON-RPC Server
//!
//! JSON-RPC 2.0 over HTTP, bound to localhost by default.

use crate::handler::RpcHandler;
use crate::types::{method, GetJobRequest, KeypairRequest};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use vanity_core::application::VanityService;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9528;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 picks a free port (see `RunningServer::local_addr`)
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// A started server
pub struct RunningServer {
    pub local_addr: SocketAddr,
    pub handle: ServerHandle,
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, service: Arc<VanityService>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(service)),
        }
    }

    fn build_module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method(method::SUBMIT, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: KeypairRequest = params.parse()?;
                    handler.submit(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(method::GET, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: GetJobRequest = params.parse()?;
                    handler.get(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Parameterless methods ignore whatever params were sent
        let handler = self.handler.clone();
        module
            .register_async_method(method::LIST, move |_, _, _| {
                let handler = handler.clone();
                async move { handler.list().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(method::GENERATE, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: KeypairRequest = params.parse()?;
                    handler.generate(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_method(method::HEALTH, move |_, _, _| {
                Ok::<_, jsonrpsee::types::ErrorObjectOwned>(handler.health())
            })
            .map_err(|e| e.to_string())?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Serving continues on the runtime until the returned handle is stopped.
    pub async fn start(self) -> Result<RunningServer, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let module = self.build_module()?;

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        info!(addr = %local_addr, "JSON-RPC server listening");

        let handle = server.start(module);
        Ok(RunningServer { local_addr, handle })
    }
}
