use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::codec::{self, Request, Response};
use super::network::{BoxedStream, Listener, Network};
use super::RpcError;

/// How long a connection may sit without sending a request frame before
/// the server closes it.
pub const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

type Handler = Box<dyn Fn(&[u8]) -> Response + Send + Sync>;

/// Procedures invocable by remote callers, keyed by method name.
///
/// Handlers run to completion on the connection task before the reply is
/// written, so they must not block.
#[derive(Default)]
pub struct HandlerSet {
    handlers: HashMap<String, Handler>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `method`, replacing any previous one.
    pub fn register<I, O, F>(&mut self, method: &str, handler: F) -> &mut Self
    where
        I: DeserializeOwned,
        O: Serialize,
        F: Fn(I) -> Result<O, String> + Send + Sync + 'static,
    {
        let wrapped = move |payload: &[u8]| -> Response {
            let input: I = codec::decode(payload).map_err(|e| format!("bad argument: {e}"))?;
            let output = handler(input)?;
            codec::encode(&output).map_err(|e| format!("bad reply: {e}"))
        };
        self.handlers.insert(method.to_string(), Box::new(wrapped));
        self
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, request: &Request) -> Response {
        match self.handlers.get(&request.method) {
            Some(handler) => handler(&request.payload),
            None => {
                warn!("Received call for unknown method {}", request.method);
                Err(format!("unknown method: {}", request.method))
            }
        }
    }
}

/// Handle to a listening endpoint.
///
/// Dropping it (or calling [`Endpoint::close`]) stops accepting new
/// connections. Connections already accepted keep being served.
pub struct Endpoint {
    network: Network,
    local_addr: String,
    socket_path: Option<PathBuf>,
    accept_task: JoinHandle<()>,
}

impl Endpoint {
    pub fn network(&self) -> Network {
        self.network
    }

    pub fn local_addr(&self) -> &str {
        &self.local_addr
    }

    pub fn close(self) {
        drop(self)
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        self.accept_task.abort();
        if let Some(path) = self.socket_path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                debug!("Failed to remove socket file {}: {e}", path.display());
            }
        }
        info!("Endpoint {}://{} closed", self.network, self.local_addr);
    }
}

/// Starts listening on `address` and serves `handlers` to every caller.
pub async fn serve(
    network: Network,
    address: &str,
    handlers: HandlerSet,
) -> Result<Endpoint, RpcError> {
    serve_with_idle_timeout(network, address, handlers, IDLE_CONNECTION_TIMEOUT).await
}

/// Like [`serve`], closing connections that send no frame within `idle`.
pub async fn serve_with_idle_timeout(
    network: Network,
    address: &str,
    handlers: HandlerSet,
    idle: Duration,
) -> Result<Endpoint, RpcError> {
    let listener = Listener::bind(network, address).await?;
    let local_addr = listener.local_addr()?;
    let socket_path = listener.socket_path();
    let handlers = Arc::new(handlers);

    info!("Listening on {network}://{local_addr} ({} methods)", handlers.len());

    let accept_task = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let handlers = Arc::clone(&handlers);
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, handlers, idle).await {
                            debug!("Connection from {peer} ended with error: {e}");
                        }
                    });
                }
                Err(e) => {
                    warn!("Accept failed: {e}");
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    });

    Ok(Endpoint {
        network,
        local_addr,
        socket_path,
        accept_task,
    })
}

async fn serve_connection(
    mut stream: BoxedStream,
    handlers: Arc<HandlerSet>,
    idle: Duration,
) -> Result<(), RpcError> {
    loop {
        let next = tokio::time::timeout(idle, codec::read_frame::<_, Request>(&mut stream)).await;
        let request = match next {
            Ok(frame) => match frame? {
                Some(request) => request,
                None => return Ok(()),
            },
            Err(_) => {
                debug!("Closing connection idle for {idle:?}");
                return Ok(());
            }
        };
        debug!("Dispatching {}", request.method);
        let response = handlers.dispatch(&request);
        codec::write_frame(&mut stream, &response).await?;
    }
}
