//! The line-oriented wire protocol.
//!
//! Commands are ASCII lines terminated by `\n` (a preceding `\r` is
//! tolerated), tokens separated by single spaces. `PUB` is followed by an
//! exact-length binary payload. Replies are newline-terminated; the `MSG`
//! reply carries the payload verbatim.
//!
//! ```text
//! PUB <topic> <length>\n<payload>   ->  OK <offset>\n | ERR: ...\n
//! READ <offset>\n                   ->  MSG <payload>\n | ERR: ...\n
//! ACK <group> <offset>\n            ->  OK\n            (malformed: no reply)
//! OFFSET <group>\n                  ->  <offset>\n      (malformed: no reply)
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append a payload of `len` bytes. The topic argument is accepted
    /// and ignored: this is a single-topic broker.
    Pub { topic: String, len: u32 },
    /// Read the record at a global offset.
    Read { offset: u64 },
    /// Checkpoint a consumer group at an offset.
    Ack { group: String, offset: u64 },
    /// Fetch a consumer group's checkpoint.
    Offset { group: String },
}

/// A command line that could not be parsed.
///
/// `PUB` and `READ` violations are answered on the wire; malformed `ACK`
/// and `OFFSET` lines are dropped without a reply, since both are
/// fire-and-forget from the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command")]
    UnknownCommand,
    #[error("Invalid PUB args")]
    InvalidPub,
    #[error("Invalid READ args")]
    InvalidRead,
    #[error("malformed ACK")]
    MalformedAck,
    #[error("malformed OFFSET")]
    MalformedOffset,
}

impl CommandError {
    /// The wire reply for this violation, or `None` for the silently
    /// dropped kinds.
    pub fn reply(&self) -> Option<Reply> {
        match self {
            CommandError::UnknownCommand | CommandError::InvalidPub | CommandError::InvalidRead => {
                Some(Reply::Error(self.to_string()))
            }
            CommandError::MalformedAck | CommandError::MalformedOffset => None,
        }
    }
}

/// Parse one trimmed command line (no trailing `\r\n`).
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    match tokens[0] {
        "PUB" => {
            if tokens.len() != 3 {
                return Err(CommandError::InvalidPub);
            }
            let len = tokens[2].parse::<u32>().map_err(|_| CommandError::InvalidPub)?;
            Ok(Command::Pub {
                topic: tokens[1].to_string(),
                len,
            })
        }
        "READ" => {
            if tokens.len() != 2 {
                return Err(CommandError::InvalidRead);
            }
            let offset = tokens[1]
                .parse::<u64>()
                .map_err(|_| CommandError::InvalidRead)?;
            Ok(Command::Read { offset })
        }
        "ACK" => {
            if tokens.len() != 3 {
                return Err(CommandError::MalformedAck);
            }
            let offset = tokens[2]
                .parse::<u64>()
                .map_err(|_| CommandError::MalformedAck)?;
            Ok(Command::Ack {
                group: tokens[1].to_string(),
                offset,
            })
        }
        "OFFSET" => {
            if tokens.len() != 2 {
                return Err(CommandError::MalformedOffset);
            }
            Ok(Command::Offset {
                group: tokens[1].to_string(),
            })
        }
        _ => Err(CommandError::UnknownCommand),
    }
}

/// A reply on its way to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `OK <offset>\n` - the record was stored at this offset.
    Stored(u64),
    /// `OK\n` - the checkpoint was persisted.
    Acked,
    /// `MSG <payload>\n` - the record at the requested offset. Payloads
    /// containing `\n` are not recoverable by a line-based reader; the
    /// framing is kept for wire compatibility.
    Record(Bytes),
    /// `<offset>\n` - a consumer group's checkpoint.
    Committed(u64),
    /// `ERR: <message>\n`
    Error(String),
}

impl Reply {
    /// Encode the reply for the wire.
    pub fn encode(&self) -> Bytes {
        match self {
            Reply::Stored(offset) => Bytes::from(format!("OK {}\n", offset)),
            Reply::Acked => Bytes::from_static(b"OK\n"),
            Reply::Record(payload) => {
                let mut buf = BytesMut::with_capacity(payload.len() + 5);
                buf.put_slice(b"MSG ");
                buf.put_slice(payload);
                buf.put_u8(b'\n');
                buf.freeze()
            }
            Reply::Committed(offset) => Bytes::from(format!("{}\n", offset)),
            Reply::Error(message) => Bytes::from(format!("ERR: {}\n", message)),
        }
    }
}
