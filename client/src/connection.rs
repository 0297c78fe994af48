//! A single connection to a silomq broker.
//!
//! One method per wire command. Requests and replies are newline-framed;
//! the `PUB` payload is written as raw bytes after its command line.
//!
//! The `MSG` reply carries the payload verbatim before the terminating
//! newline, so payloads containing `\n` cannot be recovered through this
//! line-based reader.

use crate::{ClientError, Result};
use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// A connection speaking the broker's line protocol.
#[derive(Debug)]
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    /// Connect to a broker.
    pub async fn connect<A: ToSocketAddrs + std::fmt::Debug>(addr: A) -> Result<Self> {
        let target = format!("{:?}", addr);
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ClientError::connection(format!("failed to connect to {}: {}", target, e)))?;
        debug!("connected to broker at {}", target);
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
        })
    }

    /// Publish a payload; returns the offset the broker assigned.
    pub async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<u64> {
        let header = format!("PUB {} {}\n", topic, payload.len());
        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(payload).await?;

        let reply = self.recv_line().await?;
        match reply.strip_prefix("OK ") {
            Some(offset) => offset
                .parse::<u64>()
                .map_err(|_| ClientError::protocol(format!("bad offset in reply: {}", reply))),
            None => Err(reply_error(&reply)),
        }
    }

    /// Read the record at a global offset.
    pub async fn read(&mut self, offset: u64) -> Result<Bytes> {
        self.send_line(&format!("READ {}", offset)).await?;

        let reply = self.recv_line().await?;
        match reply.strip_prefix("MSG ") {
            Some(payload) => Ok(Bytes::copy_from_slice(payload.as_bytes())),
            None => Err(reply_error(&reply)),
        }
    }

    /// Checkpoint a consumer group at an offset.
    pub async fn ack(&mut self, group: &str, offset: u64) -> Result<()> {
        self.send_line(&format!("ACK {} {}", group, offset)).await?;

        let reply = self.recv_line().await?;
        if reply == "OK" {
            Ok(())
        } else {
            Err(reply_error(&reply))
        }
    }

    /// Fetch a consumer group's checkpoint; 0 for unknown groups.
    pub async fn fetch_offset(&mut self, group: &str) -> Result<u64> {
        self.send_line(&format!("OFFSET {}", group)).await?;

        let reply = self.recv_line().await?;
        reply
            .parse::<u64>()
            .map_err(|_| reply_error(&reply))
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    async fn recv_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(ClientError::connection("broker closed the connection"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

fn reply_error(reply: &str) -> ClientError {
    match reply.strip_prefix("ERR: ") {
        Some(message) => ClientError::broker(message),
        None => ClientError::protocol(format!("unexpected reply: {}", reply)),
    }
}
