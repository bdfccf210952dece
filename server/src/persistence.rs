//! Flushing sessions to storage
//!
//! Saves happen on three occasions: when the client asks for one, on the
//! autosave interval, and when the connection closes. Client-requested
//! saves are throttled by [`ChannelConfig::save_cooldown`].

use crate::channel::Channel;
use crate::client::Client;
use crate::config::ChannelConfig;
use crate::error::HandlerResult;
use log::{debug, error, info};
use std::time::Duration;
use tokio::time::Instant;

/// Handles the client's explicit save request
pub async fn handle_player_update(client: &mut Client, channel: &Channel) -> HandlerResult {
    if !client.save_allowed(channel.config.save_cooldown) {
        if let Some(session) = client.session() {
            debug!("Skipped save for {}, last one was too recent", session.name());
        }
        return Ok(true);
    }

    client.save(channel.store.as_ref()).await?;
    Ok(true)
}

/// Schedule of automatic saves for one connection
#[derive(Debug, Clone)]
pub struct Autosave {
    interval: Option<Duration>,
    next_due: Option<Instant>,
}

impl Autosave {
    pub fn new(interval: Option<Duration>, now: Instant) -> Self {
        Self {
            interval,
            next_due: interval.map(|interval| now + interval),
        }
    }

    pub fn from_config(config: &ChannelConfig, now: Instant) -> Self {
        Self::new(config.autosave, now)
    }

    pub fn due(&self, now: Instant) -> bool {
        self.next_due.map_or(false, |next| now >= next)
    }

    pub fn mark_saved(&mut self, now: Instant) {
        if let Some(interval) = self.interval {
            self.next_due = Some(now + interval);
        }
    }
}

/// One-second housekeeping: counts uptime and runs the autosave
pub async fn tick(client: &mut Client, channel: &Channel, autosave: &mut Autosave, now: Instant) {
    let Some(session) = client.session_mut() else {
        return;
    };
    session.uptime += 1;

    if !autosave.due(now) {
        return;
    }
    autosave.mark_saved(now);
    if let Err(e) = client.save(channel.store.as_ref()).await {
        error!("Autosave for {} failed: {}", client.addr, e);
    }
}

/// Cleanup after the connection closed
pub async fn disconnect(client: &mut Client, channel: &Channel) {
    let Some(session) = client.session() else {
        return;
    };
    let character_id = session.character_id;
    info!("{} ({}) disconnected", session.name(), client.addr);

    if let Err(e) = client.save(channel.store.as_ref()).await {
        error!("Failed to save character {} on disconnect: {}", character_id, e);
    }
    if let Err(e) = channel.store.set_online(character_id, false).await {
        error!("Failed to mark character {} offline: {}", character_id, e);
    }
}
