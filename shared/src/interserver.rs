//! Messages exchanged between a channel server and the world tier
//!
//! Frames are a 4-byte little-endian length followed by a bincode body.

use serde::{Deserialize, Serialize};

/// Largest inter-server frame accepted from the world tier
pub const MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterserverMessage {
    /// World -> channel: a character is about to reconnect from `ip`
    PendingConnection { character_id: i32, ip: [u8; 4] },
    /// Channel -> world: a character finished loading on `channel_id`
    PlayerJoinedChannel { channel_id: i8, character_id: i32 },
}

impl InterserverMessage {
    /// Serializes the message with its length header
    pub fn to_frame(&self) -> Result<Vec<u8>, bincode::Error> {
        let body = bincode::serialize(self)?;
        let mut frame = Vec::with_capacity(body.len() + 4);
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Parses a frame body (without the length header)
    pub fn from_body(body: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(body)
    }
}
