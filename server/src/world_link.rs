//! Link to the world tier
//!
//! Outbound events are fire-and-forget: they are queued on a channel and a
//! background task writes them to the world server. Inbound pending
//! connection records are fed straight into the [`PendingRegistry`].

use crate::pending::PendingRegistry;
use log::{debug, error, info, warn};
use shared::interserver::MAX_FRAME_LEN;
use shared::InterserverMessage;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

pub type FrameError = Box<dyn std::error::Error + Send + Sync>;

pub trait WorldLink: Send + Sync + fmt::Debug {
    fn player_joined_channel(&self, channel_id: i8, character_id: i32);
}

/// Used when no world server is configured
#[derive(Debug, Default)]
pub struct NullWorldLink;

impl WorldLink for NullWorldLink {
    fn player_joined_channel(&self, channel_id: i8, character_id: i32) {
        debug!(
            "No world link, dropping join of character {} on channel {}",
            character_id, channel_id
        );
    }
}

#[derive(Debug, Clone)]
pub struct WorldConnection {
    tx: mpsc::UnboundedSender<InterserverMessage>,
}

impl WorldConnection {
    pub fn new(tx: mpsc::UnboundedSender<InterserverMessage>) -> Self {
        Self { tx }
    }

    /// Connects to the world server and spawns the reader and writer tasks
    pub async fn connect(
        addr: &str,
        pending: Arc<PendingRegistry>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to world server at {}", addr);

        let (mut reader, mut writer) = stream.into_split();
        let (tx, mut rx) = mpsc::unbounded_channel::<InterserverMessage>();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let frame = match message.to_frame() {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!("Failed to encode inter-server message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = writer.write_all(&frame).await {
                    error!("Lost world server connection: {}", e);
                    break;
                }
            }
        });

        tokio::spawn(async move {
            loop {
                match read_frame(&mut reader).await {
                    Ok(Some(message)) => apply_inbound(&pending, message).await,
                    Ok(None) => {
                        warn!("World server closed the connection");
                        break;
                    }
                    Err(e) => {
                        error!("Error reading from world server: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self::new(tx))
    }
}

impl WorldLink for WorldConnection {
    fn player_joined_channel(&self, channel_id: i8, character_id: i32) {
        let message = InterserverMessage::PlayerJoinedChannel {
            channel_id,
            character_id,
        };
        if let Err(e) = self.tx.send(message) {
            error!("Failed to queue inter-server message: {}", e);
        }
    }
}

/// Reads one length-prefixed frame. `Ok(None)` on a clean end of stream.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<InterserverMessage>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(format!("inter-server frame of {} bytes is too large", len).into());
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(InterserverMessage::from_body(&body)?))
}

pub async fn apply_inbound(pending: &PendingRegistry, message: InterserverMessage) {
    match message {
        InterserverMessage::PendingConnection { character_id, ip } => {
            pending.register(character_id, Ipv4Addr::from(ip)).await;
        }
        other => warn!("Unexpected message from world server: {:?}", other),
    }
}
