//! Portal entry, map changes and GM warps
//!
//! A session is always idle in some map. Entering a portal either moves it
//! within that map or warps it to the portal's destination; GM accounts can
//! additionally warp to any map by id. Nothing here persists: the new map
//! reaches storage on the next save.

use crate::channel::Channel;
use crate::client::Client;
use crate::error::HandlerResult;
use crate::gamedata::{GameData, Map, Portal};
use crate::packets;
use crate::session::ActiveSession;
use crate::utils::get_timestamp;
use log::{debug, info, warn};
use shared::{PacketReader, PacketWriter, NO_EXPLICIT_TARGET};

/// GM level needed to warp by map id
const MIN_WARP_GM_LEVEL: i32 = 3;

/// Change-map reason sent by a client whose character just died
const REASON_DIED: u8 = 1;

/// What a map change request ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved to another portal of the same map
    EnteredPortal(Portal),
    /// Moved to another map
    Warped { map_id: i32, portal_id: u8 },
    /// Nothing happened, the client just gets control back
    ActionsEnabled,
    /// A non-GM asked for a warp by map id
    Denied { target: i32 },
    /// Revival request, acknowledged only
    Revived,
}

impl Transition {
    /// Message that tells the client about the outcome
    pub fn packet(&self, session: &ActiveSession) -> Option<PacketWriter> {
        match self {
            Transition::EnteredPortal(portal) => Some(packets::portal_enter(portal)),
            Transition::Warped { map_id, portal_id } => Some(packets::warp_to_map(
                session.channel_id,
                *map_id,
                *portal_id,
                session.stats.hp,
                get_timestamp(),
            )),
            Transition::ActionsEnabled | Transition::Denied { .. } => {
                Some(packets::enable_actions())
            }
            Transition::Revived => None,
        }
    }
}

/// Walks the session into `portal`, a portal of its current map
pub fn enter(
    session: &mut ActiveSession,
    game_data: &dyn GameData,
    portal: &Portal,
) -> Transition {
    let Some(destination) = portal.destination(session.map_id()) else {
        session.enter_in_map(portal);
        return Transition::EnteredPortal(portal.clone());
    };

    let Some(map) = game_data.map(destination) else {
        warn!(
            "Portal {} in map {} leads to missing map {}",
            portal.name,
            session.map_id(),
            destination
        );
        return Transition::ActionsEnabled;
    };

    let landing = map
        .landing_portal(&portal.target_portal)
        .cloned()
        .unwrap_or_else(|| map.spawn_portal());
    warp(session, &map, &landing)
}

pub fn warp(session: &mut ActiveSession, map: &Map, portal: &Portal) -> Transition {
    session.warp_to(map, portal);
    Transition::Warped {
        map_id: map.id,
        portal_id: portal.id,
    }
}

/// Portal lookup by name, then enter it or give control back
fn enter_by_name(
    session: &mut ActiveSession,
    game_data: &dyn GameData,
    name: &str,
) -> Transition {
    match session.portal(game_data, name) {
        Some(portal) => enter(session, game_data, &portal),
        None => {
            debug!("Enabled actions for {}", session.name());
            Transition::ActionsEnabled
        }
    }
}

/// State machine behind the general change-map message
pub fn change_map(
    session: &mut ActiveSession,
    game_data: &dyn GameData,
    target: i32,
    portal_name: &str,
) -> Transition {
    if target == NO_EXPLICIT_TARGET {
        return enter_by_name(session, game_data, portal_name);
    }

    if !session.is_alive() {
        // TODO: respawn at the map's return map with hp restored
        info!("Revive requested for {}", session.name());
        return Transition::Revived;
    }

    if session.gm_level < MIN_WARP_GM_LEVEL {
        warn!(
            "{} tried to map warp to {} without gm powers",
            session.name(),
            target
        );
        return Transition::Denied { target };
    }

    let old_map = session.map_id();
    match session.set_map_id(game_data, target) {
        Ok(map) => {
            let spawn = map.spawn_portal();
            warp(session, &map, &spawn)
        }
        Err(e) => {
            session.stats.map_id = old_map;
            debug!("GM warp of {} failed: {}", session.name(), e);
            Transition::ActionsEnabled
        }
    }
}

fn apply(
    client: &mut Client,
    transition: impl FnOnce(&mut ActiveSession) -> Transition,
) -> HandlerResult {
    let Some(session) = client.session_mut() else {
        return Ok(false);
    };
    let transition = transition(session);
    debug!("{} map transition: {:?}", session.name(), transition);

    if let Some(packet) = transition.packet(session) {
        client.send(packet)?;
    }
    Ok(true)
}

/// Handles the special map change message (scripted portals)
pub fn handle_change_map_special(
    client: &mut Client,
    channel: &Channel,
    it: &mut PacketReader<'_>,
) -> HandlerResult {
    let _reason = it.read_u8()?;
    let portal_name = it.read_string()?;
    it.skip(2)?;

    if let Some(session) = client.session() {
        debug!(
            "{} entered {} in map {}",
            session.name(),
            portal_name,
            session.map_id()
        );
    }

    apply(client, |session| {
        enter_by_name(session, channel.game_data.as_ref(), &portal_name)
    })
}

/// Handles the map change or revival message
pub fn handle_change_map(
    client: &mut Client,
    channel: &Channel,
    it: &mut PacketReader<'_>,
) -> HandlerResult {
    let reason = it.read_u8()?;
    let target = it.read_i32()?;
    let portal_name = it.read_string()?;

    if let Some(session) = client.session() {
        if reason == REASON_DIED {
            debug!("{} died", session.name());
        } else {
            debug!("{} is entering portal {}", session.name(), portal_name);
        }
    }

    apply(client, |session| {
        change_map(session, channel.game_data.as_ref(), target, &portal_name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{test_maps, test_session};
    use shared::opcodes::outbound;

    #[test]
    fn test_enter_same_map_portal() {
        let maps = test_maps();
        let mut session = test_session(0, 100);

        let transition = enter_by_name(&mut session, &maps, "hop");

        assert!(matches!(&transition, Transition::EnteredPortal(p) if p.id == 2));
        assert_eq!(session.map_id(), 100);
        assert_eq!(session.position, (-30, 90));
    }

    #[test]
    fn test_enter_portal_to_other_map() {
        let maps = test_maps();
        let mut session = test_session(0, 100);

        let transition = enter_by_name(&mut session, &maps, "out");

        assert_eq!(
            transition,
            Transition::Warped {
                map_id: 5,
                portal_id: 3
            }
        );
        assert_eq!(session.map_id(), 5);
        assert_eq!(session.stats.spawn_point, 3);
    }

    #[test]
    fn test_missing_portal_enables_actions() {
        let maps = test_maps();
        let mut session = test_session(0, 100);
        let before = session.clone();

        assert_eq!(
            enter_by_name(&mut session, &maps, "nope"),
            Transition::ActionsEnabled
        );
        assert_eq!(session, before);
    }

    #[test]
    fn test_session_in_unknown_map_enables_actions() {
        let maps = test_maps();
        let mut session = test_session(0, 4242);
        assert_eq!(
            enter_by_name(&mut session, &maps, "sp"),
            Transition::ActionsEnabled
        );
    }

    #[test]
    fn test_gm_warp() {
        let maps = test_maps();
        let mut session = test_session(3, 100);

        let transition = change_map(&mut session, &maps, 5, "");

        assert_eq!(
            transition,
            Transition::Warped {
                map_id: 5,
                portal_id: 0
            }
        );
        assert_eq!(session.map_id(), 5);
        assert_eq!(session.position, (7, 8));
    }

    #[test]
    fn test_warp_denied_below_gm_level_3() {
        let maps = test_maps();
        let mut session = test_session(2, 100);
        let before = session.clone();

        assert_eq!(
            change_map(&mut session, &maps, 5, ""),
            Transition::Denied { target: 5 }
        );
        assert_eq!(session, before);
    }

    #[test]
    fn test_gm_warp_to_invalid_map_rolls_back() {
        let maps = test_maps();
        let mut session = test_session(5, 100);

        assert_eq!(
            change_map(&mut session, &maps, 123456, ""),
            Transition::ActionsEnabled
        );
        assert_eq!(session.map_id(), 100);
    }

    #[test]
    fn test_dead_character_with_target_is_revival() {
        let maps = test_maps();
        let mut session = test_session(5, 100);
        session.stats.hp = 0;

        assert_eq!(change_map(&mut session, &maps, 5, ""), Transition::Revived);
        assert_eq!(session.map_id(), 100);
    }

    #[test]
    fn test_no_target_behaves_like_special_entry() {
        let maps = test_maps();
        let mut special = test_session(0, 100);
        let mut general = test_session(0, 100);

        assert_eq!(
            change_map(&mut general, &maps, NO_EXPLICIT_TARGET, "hop"),
            enter_by_name(&mut special, &maps, "hop")
        );
        assert_eq!(general, special);
    }

    #[test]
    fn test_no_target_missing_portal_enables_actions() {
        let maps = test_maps();
        let mut session = test_session(0, 100);
        let before = session.clone();

        assert_eq!(
            change_map(&mut session, &maps, NO_EXPLICIT_TARGET, "nope"),
            Transition::ActionsEnabled
        );
        assert_eq!(session, before);
    }

    #[test]
    fn test_transition_packets() {
        let session = test_session(0, 100);
        let opcode = |t: Transition| {
            t.packet(&session)
                .map(|p| u16::from_le_bytes([p.as_slice()[0], p.as_slice()[1]]))
        };

        assert_eq!(opcode(Transition::ActionsEnabled), Some(outbound::STATS_UPDATE));
        assert_eq!(opcode(Transition::Denied { target: 1 }), Some(outbound::STATS_UPDATE));
        assert_eq!(
            opcode(Transition::Warped {
                map_id: 5,
                portal_id: 0
            }),
            Some(outbound::WARP_TO_MAP)
        );
        assert_eq!(opcode(Transition::Revived), None);
    }
}
