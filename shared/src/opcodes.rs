//! Opcode tables for the channel protocol

/// Client -> channel server
pub mod inbound {
    /// First message on a fresh connection, carries the character id
    pub const LOAD_CHARACTER: u16 = 0x0014;
    /// Sent by the client on focus changes, nothing to do with it yet
    pub const IGNORED_1: u16 = 0x0018;
    /// Periodic client heartbeat-like message, nothing to do with it yet
    pub const IGNORED_2: u16 = 0x00A7;
    pub const CHANGE_MAP: u16 = 0x0023;
    pub const CHANGE_MAP_SPECIAL: u16 = 0x005C;
    /// Explicit "save me" request
    pub const PLAYER_UPDATE: u16 = 0x00C0;
}

/// Channel server -> client
pub mod outbound {
    pub const STATS_UPDATE: u16 = 0x001C;
    pub const BROADCAST_MESSAGE: u16 = 0x0041;
    pub const WARP_TO_MAP: u16 = 0x005C;
    pub const PORTAL_ENTER: u16 = 0x005F;
}
