//! The HTTP server as a bridge platform.
//!
//! Binding happens at startup so a taken port fails the bootstrap early;
//! serving starts with the other background work and stops gracefully on
//! shutdown.

use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use hearth_app::ports::Platform;
use hearth_domain::error::BridgeError;

use crate::error::HttpError;

/// Platform name of the HTTP server.
pub const HTTP_PLATFORM: &str = "HTTP";

struct Running {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Serves an assembled [`Router`] on one address.
pub struct HttpPlatform {
    bind: String,
    router: Router,
    local_addr: OnceLock<SocketAddr>,
    listener: Mutex<Option<TcpListener>>,
    running: Mutex<Option<Running>>,
}

impl HttpPlatform {
    #[must_use]
    pub fn new(bind: impl Into<String>, router: Router) -> Self {
        Self {
            bind: bind.into(),
            router,
            local_addr: OnceLock::new(),
            listener: Mutex::new(None),
            running: Mutex::new(None),
        }
    }

    /// Address actually bound, once started.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    async fn bind(&self) -> Result<(), HttpError> {
        let bind_error = |source| HttpError::Bind {
            address: self.bind.clone(),
            source,
        };
        let listener = TcpListener::bind(&self.bind).await.map_err(bind_error)?;
        let addr = listener.local_addr().map_err(bind_error)?;
        let _ = self.local_addr.set(addr);
        *lock(&self.listener) = Some(listener);
        tracing::info!(%addr, "http listener bound");
        Ok(())
    }
}

#[async_trait]
impl Platform for HttpPlatform {
    fn name(&self) -> &'static str {
        HTTP_PLATFORM
    }

    async fn startup(&self) -> Result<(), BridgeError> {
        self.bind().await.map_err(HttpError::into_domain)
    }

    async fn background(&self) -> Result<(), BridgeError> {
        let Some(listener) = lock(&self.listener).take() else {
            return Ok(());
        };
        let (stop, stopped) = oneshot::channel::<()>();
        let router = self.router.clone();
        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = stopped.await;
            };
            if let Err(err) = axum::serve(listener, router).with_graceful_shutdown(shutdown).await {
                tracing::error!(error = %err, "http server failed");
            }
        });
        *lock(&self.running) = Some(Running { stop, task });
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BridgeError> {
        let running = lock(&self.running).take();
        if let Some(Running { stop, task }) = running {
            let _ = stop.send(());
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "http server task ended abnormally");
            }
            tracing::info!("http server stopped");
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
