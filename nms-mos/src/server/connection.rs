//! Per-connection read/dispatch/ack loop
//!
//! Units on one connection are handled strictly in order: the next unit is
//! not read until the previous one's acknowledgment has been written.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::context::ClientContext;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::Result;
use crate::protocol::{Frame, FrameAccumulator, ACK_TERMINATOR};

/// Settings shared by every connection of one listener
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub ctx: ClientContext,
    pub max_message_bytes: usize,
}

/// Counters reported when a connection closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub units: u64,
    pub acks: u64,
    pub ignored: u64,
    pub oversized: u64,
}

/// Serve one MOS peer until it closes the stream
///
/// Generic over the stream so the loop can run over in-memory pipes.
/// Transport errors end the connection and are returned to the caller.
pub async fn serve_connection<S>(
    stream: S,
    dispatcher: &Dispatcher,
    settings: ConnectionSettings,
) -> Result<ConnectionStats>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut framer = FrameAccumulator::new(settings.max_message_bytes);
    let mut stats = ConnectionStats::default();
    let mut line = Vec::with_capacity(4096);
    let read_limit = settings.max_message_bytes as u64 + 1;

    loop {
        line.clear();
        let read = (&mut reader)
            .take(read_limit)
            .read_until(b'\n', &mut line)
            .await?;

        let at_eof = read == 0;
        let frames = if at_eof {
            framer.finish().into_iter().collect()
        } else {
            framer.push(&String::from_utf8_lossy(&line))
        };

        for frame in frames {
            match frame {
                Frame::Oversized(bytes) => {
                    stats.oversized += 1;
                    warn!(
                        bytes,
                        limit = settings.max_message_bytes,
                        "Discarded oversized MOS message"
                    );
                }
                Frame::Complete(unit) => {
                    stats.units += 1;
                    debug!(bytes = unit.len(), "Received MOS unit");

                    match dispatcher.dispatch(&settings.ctx, &unit).await {
                        DispatchOutcome::Acknowledged { ack, .. } => {
                            let mut document = ack.render();
                            document.push_str(ACK_TERMINATOR);
                            write_half.write_all(document.as_bytes()).await?;
                            write_half.flush().await?;
                            stats.acks += 1;
                        }
                        DispatchOutcome::Ignored(_) => stats.ignored += 1,
                    }
                }
            }
        }

        if at_eof {
            return Ok(stats);
        }
    }
}
