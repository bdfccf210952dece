//! Wire-level protocol shared by the channel server and its tools
//!
//! - [`packet`]: little-endian reader/writer for client messages
//! - [`opcodes`]: inbound and outbound opcode tables
//! - [`stats`]: the character stats block sent on connect and saved to storage
//! - [`interserver`]: messages exchanged with the world tier

pub mod interserver;
pub mod opcodes;
pub mod packet;
pub mod stats;

pub use interserver::InterserverMessage;
pub use packet::{DecodeError, DecodeResult, PacketReader, PacketWriter};
pub use stats::CharacterStats;

/// Map id meaning "this portal does not lead anywhere"
pub const NO_TARGET_MAP: i32 = 999_999_999;

/// Map id sent by the client when a change-map message has no explicit target
pub const NO_EXPLICIT_TARGET: i32 = -1;
