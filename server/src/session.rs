//! Session state of one connection
//!
//! A connection starts [`SessionState::Unauthenticated`] and becomes
//! [`SessionState::Active`] once admission has loaded the character,
//! greeted the client and marked it online. Game messages are only routed
//! to handlers that receive an [`ActiveSession`].

use crate::gamedata::{GameData, Map, Portal};
use crate::storage::CharacterSnapshot;
use shared::CharacterStats;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub user_id: i32,
    pub character_id: i32,
    pub world_id: i8,
    pub channel_id: i8,
    pub gm_level: i32,
    pub admin: bool,
    pub gm_chat: bool,
    pub meso: i32,
    pub stats: CharacterStats,
    pub buddylist_size: u8,
    /// equip, use, set-up, etc, cash
    pub inventory_slots: [u8; 5],
    /// Seconds since the character loaded on this channel
    pub uptime: u64,
    pub position: (i16, i16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("map {0} does not exist")]
pub struct UnknownMap(pub i32);

impl ActiveSession {
    pub fn name(&self) -> &str {
        &self.stats.name
    }

    pub fn map_id(&self) -> i32 {
        self.stats.map_id
    }

    pub fn is_alive(&self) -> bool {
        self.stats.is_alive()
    }

    pub fn current_map(&self, game_data: &dyn GameData) -> Option<Arc<Map>> {
        game_data.map(self.stats.map_id)
    }

    /// Looks `name` up in the current map
    pub fn portal(&self, game_data: &dyn GameData, name: &str) -> Option<Portal> {
        self.current_map(game_data)
            .and_then(|map| map.portal(name).cloned())
    }

    /// Moves the session to `map_id`, failing if no such map exists
    pub fn set_map_id(
        &mut self,
        game_data: &dyn GameData,
        map_id: i32,
    ) -> Result<Arc<Map>, UnknownMap> {
        let map = game_data.map(map_id).ok_or(UnknownMap(map_id))?;
        self.stats.map_id = map_id;
        Ok(map)
    }

    /// Same-map portal entry: only the position follows the portal
    pub fn enter_in_map(&mut self, portal: &Portal) {
        self.position = (portal.x, portal.y);
    }

    /// Full warp bookkeeping: map, spawn point and position
    pub fn warp_to(&mut self, map: &Map, portal: &Portal) {
        self.stats.map_id = map.id;
        self.stats.spawn_point = portal.id;
        self.position = (portal.x, portal.y);
    }

    pub fn snapshot(&self) -> CharacterSnapshot {
        CharacterSnapshot {
            character_id: self.character_id,
            stats: self.stats.clone(),
            meso: self.meso,
            buddylist_size: self.buddylist_size,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Active(Box<ActiveSession>),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gamedata::MapRegistry;

    pub(crate) fn test_session(gm_level: i32, map_id: i32) -> ActiveSession {
        ActiveSession {
            user_id: 1,
            character_id: 10,
            world_id: 0,
            channel_id: 1,
            gm_level,
            admin: false,
            gm_chat: false,
            meso: 0,
            stats: CharacterStats {
                id: 10,
                name: "Tester".to_string(),
                hp: 50,
                max_hp: 50,
                map_id,
                ..Default::default()
            },
            buddylist_size: 20,
            inventory_slots: [100; 5],
            uptime: 0,
            position: (0, 0),
        }
    }

    pub(crate) fn test_maps() -> MapRegistry {
        MapRegistry::from_json_str(
            r#"[
                {"id": 100, "portals": [
                    {"id": 0, "name": "sp", "x": 1, "y": 2},
                    {"id": 1, "name": "out", "x": 50, "y": 60, "target_map": 5, "target_portal": "in"},
                    {"id": 2, "name": "hop", "x": -30, "y": 90}
                ]},
                {"id": 5, "portals": [
                    {"id": 0, "name": "sp", "x": 7, "y": 8},
                    {"id": 3, "name": "in", "x": 70, "y": 80, "target_map": 100, "target_portal": "out"}
                ]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_set_map_id_rejects_unknown_map() {
        let maps = test_maps();
        let mut session = test_session(0, 100);

        assert_eq!(session.set_map_id(&maps, 42), Err(UnknownMap(42)));
        assert_eq!(session.map_id(), 100);

        assert_eq!(session.set_map_id(&maps, 5).unwrap().id, 5);
        assert_eq!(session.map_id(), 5);
    }

    #[test]
    fn test_enter_in_map_keeps_map() {
        let maps = test_maps();
        let mut session = test_session(0, 100);
        let portal = session.portal(&maps, "hop").unwrap();

        session.enter_in_map(&portal);

        assert_eq!(session.map_id(), 100);
        assert_eq!(session.stats.spawn_point, 0);
        assert_eq!(session.position, (-30, 90));
    }

    #[test]
    fn test_warp_updates_bookkeeping() {
        let maps = test_maps();
        let mut session = test_session(0, 100);
        let map = maps.map(5).unwrap();
        let portal = map.portal("in").unwrap().clone();

        session.warp_to(&map, &portal);

        assert_eq!(session.map_id(), 5);
        assert_eq!(session.stats.spawn_point, 3);
        assert_eq!(session.position, (70, 80));
    }

    #[test]
    fn test_snapshot_carries_progress() {
        let mut session = test_session(0, 100);
        session.meso = 1234;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.character_id, 10);
        assert_eq!(snapshot.meso, 1234);
        assert_eq!(snapshot.stats.map_id, 100);
    }
}
