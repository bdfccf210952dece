//! Routing of inbound game messages
//!
//! Before admission only the load-character message is accepted; every
//! other message reports `Ok(false)` so the caller can offer it to the next
//! handling stage. Once the session is active, load-character is no longer
//! ours either.

use crate::admission::handle_load_character;
use crate::channel::Channel;
use crate::client::Client;
use crate::error::HandlerResult;
use crate::persistence::handle_player_update;
use crate::transition::{handle_change_map, handle_change_map_special};
use log::trace;
use shared::opcodes::inbound;
use shared::PacketReader;

/// Dispatches one message. `packet` starts with the u16 opcode.
pub async fn handle(client: &mut Client, channel: &Channel, packet: &[u8]) -> HandlerResult {
    let mut it = PacketReader::new(packet);
    let header = it.read_u16()?;
    trace!("{} sent opcode 0x{:04X}", client.addr, header);

    if !client.connected() {
        return match header {
            inbound::LOAD_CHARACTER => handle_load_character(client, channel, &mut it).await,
            _ => Ok(false),
        };
    }

    match header {
        inbound::IGNORED_1 | inbound::IGNORED_2 => Ok(true),
        inbound::PLAYER_UPDATE => handle_player_update(client, channel).await,
        inbound::CHANGE_MAP_SPECIAL => handle_change_map_special(client, channel, &mut it),
        inbound::CHANGE_MAP => handle_change_map(client, channel, &mut it),
        _ => Ok(false),
    }
}
