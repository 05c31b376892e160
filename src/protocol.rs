//! TCP protocol between a pose provider and the assessment server.
//!
//! Messages are bincode-encoded and length-delimited.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::monitor::AssessMode;
use crate::pose::Landmark;
use crate::reba::AssessmentResult;

/// A 33-slot frame is well under this; anything larger is garbage.
const MAX_FRAME_LENGTH: usize = 64 * 1024;

// --- Message types ---

/// Provider → server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// One pose-estimation result. Slots are validated server-side.
    Frame {
        timestamp_us: u64,
        landmarks: Vec<Option<Landmark>>,
    },
    /// Weight input is free text; non-numeric becomes 0 kg.
    SetContext { weight: String, activity: String },
    SetMode { mode: AssessMode },
    Snapshot,
    SwitchCamera,
}

/// Server → provider
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Ready { mode: AssessMode },
    Assessment {
        timestamp_us: u64,
        result: AssessmentResult,
    },
    Rejected { error: String },
}

// --- TCP codec helpers ---

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

/// Create a framed message stream with length-delimited framing.
pub fn message_stream(stream: TcpStream) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec();
    Framed::new(stream, codec)
}

/// Send a serializable message (bincode + length prefix).
pub async fn send_message<T: Serialize>(
    stream: &mut MessageStream,
    msg: &T,
) -> anyhow::Result<()> {
    let data = bincode::serialize(msg)?;
    stream.send(Bytes::from(data)).await?;
    Ok(())
}

/// Receive and deserialize a message. `None` once the peer hangs up.
pub async fn recv_message<T: DeserializeOwned>(
    stream: &mut MessageStream,
) -> anyhow::Result<Option<T>> {
    match stream.next().await {
        Some(Ok(bytes)) => Ok(Some(bincode::deserialize(&bytes)?)),
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}
