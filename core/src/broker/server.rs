//! The TCP protocol server.
//!
//! Accepts connections on the configured bind address and runs one spawned
//! task per connection. Each task loops reading newline-terminated command
//! lines and writing framed replies; connections persist until the client
//! closes or an I/O error occurs. A broadcast channel coordinates shutdown
//! with the accept loop and the retention cleaner.

use crate::broker::MessageHandler;
use crate::config::BrokerConfig;
use crate::protocol::{self, Command};
use crate::storage::{wal, OffsetManager, Wal, WalConfig};
use crate::{Result, SilomqError};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

pub struct BrokerServer {
    config: BrokerConfig,
    wal: Arc<Wal>,
    handler: Arc<MessageHandler>,
    shutdown_tx: broadcast::Sender<()>,
}

impl BrokerServer {
    /// Open the storage engines and prepare the server. Startup failures
    /// here (bad config, directory creation, active-segment open) are
    /// fatal to the process.
    pub fn new(config: BrokerConfig) -> Result<Self> {
        config.validate().map_err(SilomqError::Config)?;

        let data_dir = PathBuf::from(&config.storage.data_dir);
        let wal = Arc::new(Wal::open(WalConfig {
            dir: data_dir.join(&config.storage.topic),
            max_segment_size: config.storage.max_segment_size_bytes,
            retention: Duration::from_millis(config.storage.retention_ms),
        })?);
        let offsets = Arc::new(OffsetManager::open(&data_dir));
        let handler = Arc::new(MessageHandler::new(Arc::clone(&wal), offsets));
        let (shutdown_tx, _) = broadcast::channel(16);

        Ok(Self {
            config,
            wal,
            handler,
            shutdown_tx,
        })
    }

    /// Signal the accept loop and the retention cleaner to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!("silomq broker listening on {}", addr);

        let cleaner = wal::spawn_cleaner(
            Arc::clone(&self.wal),
            Duration::from_millis(self.config.storage.cleaner_interval_ms),
            self.shutdown_tx.subscribe(),
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!("client connected: {}", peer_addr);
                            let handler = Arc::clone(&self.handler);
                            tokio::spawn(async move {
                                match handle_connection(stream, handler).await {
                                    Ok(()) => debug!("client {} disconnected", peer_addr),
                                    Err(e) => debug!("client {} dropped: {}", peer_addr, e),
                                }
                            });
                        }
                        Err(e) => error!("failed to accept connection: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("received shutdown signal, stopping server");
                    break;
                }
            }
        }

        // The cleaner subscribed to the same shutdown channel.
        let _ = cleaner.await;
        self.wal.close()?;
        info!("server shutdown complete");
        Ok(())
    }
}

/// Request loop for one client connection.
async fn handle_connection(stream: TcpStream, handler: Arc<MessageHandler>) -> io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let trimmed = line.trim();
        // Blank lines are skipped; this also consumes the optional CRLF
        // trailing a PUB payload without delaying the reply.
        if trimmed.is_empty() {
            continue;
        }

        let reply = match protocol::parse_command(trimmed) {
            Ok(Command::Pub { len, .. }) => {
                let mut payload = vec![0u8; len as usize];
                reader.read_exact(&mut payload).await?;
                handler.handle_publish(&payload)
            }
            Ok(Command::Read { offset }) => handler.handle_read(offset),
            Ok(Command::Ack { group, offset }) => handler.handle_ack(&group, offset),
            Ok(Command::Offset { group }) => handler.handle_offset(&group),
            Err(violation) => match violation.reply() {
                Some(reply) => reply,
                None => continue,
            },
        };

        write_half.write_all(&reply.encode()).await?;
    }
}
