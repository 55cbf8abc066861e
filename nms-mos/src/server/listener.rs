//! MOS TCP listener

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::connection::{serve_connection, ConnectionSettings};
use crate::dispatch::Dispatcher;
use crate::error::Result;

const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Accepts MOS peers and runs one task per connection
pub struct MosServer {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    settings: ConnectionSettings,
}

impl MosServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        dispatcher: Arc<Dispatcher>,
        settings: ConnectionSettings,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            dispatcher,
            settings,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Connections already running are not awaited; they end when the
    /// runtime shuts down or their peer disconnects.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        info!("MOS listener accepting on {}", self.local_addr()?);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("MOS listener stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(err) => {
                        warn!(error = %err, "Failed to accept MOS connection");
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                },
            }
        }
    }

    fn spawn_connection(&self, stream: tokio::net::TcpStream, peer: SocketAddr) {
        let connection_id = Uuid::new_v4();
        let dispatcher = Arc::clone(&self.dispatcher);
        let settings = self.settings;

        if let Err(err) = stream.set_nodelay(true) {
            warn!(%peer, error = %err, "Failed to set TCP_NODELAY");
        }

        let span = info_span!("mos_connection", %connection_id, %peer);
        tokio::spawn(
            async move {
                info!("MOS peer connected");
                match serve_connection(stream, &dispatcher, settings).await {
                    Ok(stats) => info!(
                        units = stats.units,
                        acks = stats.acks,
                        ignored = stats.ignored,
                        oversized = stats.oversized,
                        "MOS peer disconnected"
                    ),
                    Err(err) => error!(error = %err, "MOS connection closed on error"),
                }
            }
            .instrument(span),
        );
    }
}
