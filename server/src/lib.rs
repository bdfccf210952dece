//! # Channel Server Library
//!
//! This library implements the player-facing core of a channel server: the
//! shard of a game world that players are handed to after logging in. It
//! admits reconnecting players, keeps one session per connection, and
//! serves the map transition and save requests of admitted players.
//!
//! ## Core Responsibilities
//!
//! ### Admission
//! The world tier announces each handoff by recording the address a
//! character is expected to reconnect from. The channel matches the
//! reconnecting peer against that record, rejects mismatches as hijack
//! attempts, and tolerates records that never arrive once a ceiling has
//! passed. Admitted players receive the initial character data and,
//! when configured, the world's scrolling header.
//!
//! ### Map Transitions
//! Players move between portals of a map, through portals into other
//! maps, and GM accounts can warp to any map by id. Requests the player
//! is not allowed to make are logged and answered with an enable-actions
//! reply so the client never stays locked.
//!
//! ### Persistence
//! Sessions are flushed to storage on request (throttled), on the autosave
//! interval and when the connection closes.
//!
//! ## Architecture Design
//!
//! ### One Task Per Connection
//! Each connection is owned by a single task, so a session is never
//! touched concurrently. Helper tasks read frames from and write frames to
//! the socket; the connection task reacts to complete frames and a
//! one-second housekeeping tick.
//!
//! ### Shared State
//! The only state shared between connections is the pending connection
//! registry, the server status cell and the storage and map collaborators,
//! all reachable through [`channel::Channel`].
//!
//! ## Module Organization
//!
//! - `network`: TCP listener, framing and the per-connection loop
//! - `client_manager`: connection ids and the capacity limit
//! - `handler`: routes messages by opcode, gated on admission
//! - `admission`, `transition`, `persistence`: the message handlers
//! - `session`, `client`: per-connection state
//! - `pending`, `status`: state shared across connections
//! - `storage`, `gamedata`, `world_link`: collaborators
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::channel::Channel;
//! use server::config::{ChannelConfig, WorldConfig};
//! use server::gamedata::MapRegistry;
//! use server::network::ChannelServer;
//! use server::pending::PendingRegistry;
//! use server::status::{ServerStatus, StatusCell};
//! use server::storage::MemoryStore;
//! use server::world_link::NullWorldLink;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let channel = Arc::new(Channel {
//!         config: ChannelConfig::default(),
//!         pending: Arc::new(PendingRegistry::new()),
//!         status: StatusCell::new(ServerStatus {
//!             channel_id: 0,
//!             world: WorldConfig::default(),
//!             world_link: Arc::new(NullWorldLink),
//!         }),
//!         store: Arc::new(MemoryStore::new()),
//!         game_data: Arc::new(MapRegistry::default()),
//!     });
//!
//!     let server = ChannelServer::bind("127.0.0.1:7575", channel).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod admission;
pub mod channel;
pub mod client;
pub mod client_manager;
pub mod config;
pub mod error;
pub mod gamedata;
pub mod handler;
pub mod network;
pub mod packets;
pub mod pending;
pub mod persistence;
pub mod session;
pub mod status;
pub mod storage;
pub mod transition;
pub mod utils;
pub mod world_link;
