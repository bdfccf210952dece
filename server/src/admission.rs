//! Turning a fresh connection into a player session
//!
//! The client reconnects to the channel after the world tier has recorded
//! the address it is expected to come from. Admission waits for that
//! record (bounded by [`AdmissionPolicy`](crate::config::AdmissionPolicy)),
//! rejects address mismatches as hijack attempts, loads the character,
//! greets the client and announces the join to the world tier.
//!
//! A record that never shows up is tolerated: the character is admitted
//! once the wait ceiling passes.

use crate::channel::Channel;
use crate::client::Client;
use crate::error::{HandlerError, HandlerResult};
use crate::packets;
use crate::pending::PendingLookup;
use crate::session::ActiveSession;
use crate::storage::{stats_from_row, Row};
use crate::utils::{get_timestamp, ipv4_of};
use log::{info, warn};
use rand::Rng;
use shared::PacketReader;
use std::sync::Arc;

const DEFAULT_SLOTS: i64 = 100;

/// Handles the load-character message, the first one a client sends
pub async fn handle_load_character(
    client: &mut Client,
    channel: &Channel,
    it: &mut PacketReader<'_>,
) -> HandlerResult {
    let character_id = it.read_i32()?;
    let observed = ipv4_of(&client.addr).ok_or(HandlerError::UnsupportedAddress(client.addr))?;

    let lookup = channel
        .pending
        .await_registration(character_id, observed, &channel.config.admission)
        .await;
    match lookup {
        PendingLookup::Mismatch(expected) => {
            warn!("{} tried to remote hack {}", observed, expected);
            return Err(HandlerError::HijackAttempt { observed, expected });
        }
        PendingLookup::Matched => {}
        PendingLookup::Absent => {
            info!(
                "Admitting character {} from {} without a pending connection",
                character_id, observed
            );
            channel.pending.remove(character_id).await;
        }
    }

    let rows = channel.store.load_character(character_id).await?;
    let row = rows
        .first()
        .ok_or(HandlerError::CharacterNotFound(character_id))?;
    let mut session = session_from_row(row, client.gm_chat)?;

    if let Some(map) = channel.game_data.map(session.map_id()) {
        if let Some(spawn) = map.portal_by_id(session.stats.spawn_point) {
            session.position = (spawn.x, spawn.y);
        }
    }

    let (channel_id, header, world_link) = {
        let status = channel.status.acquire().await;
        (
            status.channel_id,
            status.world.scrolling_header().map(str::to_string),
            Arc::clone(&status.world_link),
        )
    };
    session.channel_id = channel_id;

    let seed: i32 = rand::thread_rng().gen_range(0..i32::MAX);
    client.send(packets::connect_data(&session, channel_id, seed, get_timestamp()))?;
    if let Some(header) = header {
        client.send(packets::scrolling_header(&header))?;
    }

    info!("{} connected as {}", client.addr, session.name());

    channel.store.set_online(character_id, true).await?;
    client.activate(session);

    world_link.player_joined_channel(channel_id, character_id);
    Ok(true)
}

fn session_from_row(row: &Row, gm_chat: bool) -> Result<ActiveSession, HandlerError> {
    let stats = stats_from_row(row)?;
    let gm_level = row.int("gm_level")? as i32;

    let mut inventory_slots = [0u8; 5];
    let columns = ["equip_slots", "use_slots", "setup_slots", "etc_slots", "cash_slots"];
    for (slots, column) in inventory_slots.iter_mut().zip(columns) {
        *slots = row.int_or(column, DEFAULT_SLOTS)? as u8;
    }

    Ok(ActiveSession {
        user_id: row.int("user_id")? as i32,
        character_id: stats.id,
        world_id: row.int("world_id")? as i8,
        channel_id: 0,
        gm_level,
        admin: row.int("admin")? > 0,
        gm_chat: gm_chat && gm_level > 0,
        meso: row.int("meso")? as i32,
        buddylist_size: row.int("buddylist_size")? as u8,
        inventory_slots,
        uptime: 0,
        position: (0, 0),
        stats,
    })
}
