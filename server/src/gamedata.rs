//! Read-only map and portal definitions

use serde::Deserialize;
use shared::NO_TARGET_MAP;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A named point of transition inside a map
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Portal {
    pub id: u8,
    pub name: String,
    #[serde(default)]
    pub x: i16,
    #[serde(default)]
    pub y: i16,
    #[serde(default = "no_target_map")]
    pub target_map: i32,
    #[serde(default)]
    pub target_portal: String,
}

fn no_target_map() -> i32 {
    NO_TARGET_MAP
}

impl Portal {
    /// Destination map, if this portal leads out of `current_map`
    pub fn destination(&self, current_map: i32) -> Option<i32> {
        if self.target_map == NO_TARGET_MAP || self.target_map == current_map {
            None
        } else {
            Some(self.target_map)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Map {
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub portals: Vec<Portal>,
}

impl Map {
    /// Looks up a portal by name. A missing portal is an expected outcome.
    pub fn portal(&self, name: &str) -> Option<&Portal> {
        self.portals.iter().find(|p| p.name == name)
    }

    pub fn portal_by_id(&self, id: u8) -> Option<&Portal> {
        self.portals.iter().find(|p| p.id == id)
    }

    /// Portal a warp lands on: `name` if it exists, portal 0 otherwise
    pub fn landing_portal(&self, name: &str) -> Option<&Portal> {
        self.portal(name).or_else(|| self.portal_by_id(0))
    }

    /// Portal 0, or the map origin if the map defines none
    pub fn spawn_portal(&self) -> Portal {
        self.portal_by_id(0).cloned().unwrap_or_else(|| Portal {
            id: 0,
            name: "sp".to_string(),
            x: 0,
            y: 0,
            target_map: NO_TARGET_MAP,
            target_portal: String::new(),
        })
    }
}

pub trait GameData: Send + Sync {
    fn map(&self, id: i32) -> Option<Arc<Map>>;
}

/// Map catalogue loaded at startup
#[derive(Debug, Default)]
pub struct MapRegistry {
    maps: HashMap<i32, Arc<Map>>,
}

impl MapRegistry {
    pub fn new(maps: Vec<Map>) -> Self {
        Self {
            maps: maps.into_iter().map(|m| (m.id, Arc::new(m))).collect(),
        }
    }

    /// Parses a JSON array of maps
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let maps: Vec<Map> = serde_json::from_str(json)?;
        Ok(Self::new(maps))
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&json)?)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl GameData for MapRegistry {
    fn map(&self, id: i32) -> Option<Arc<Map>> {
        self.maps.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = r#"[
        {"id": 100, "name": "Town", "portals": [
            {"id": 0, "name": "sp", "x": 10, "y": 20},
            {"id": 1, "name": "east00", "x": 500, "y": 20, "target_map": 200, "target_portal": "west00"},
            {"id": 2, "name": "tp", "x": 300, "y": -40, "target_map": 100}
        ]},
        {"id": 200, "name": "Field", "portals": [
            {"id": 0, "name": "sp"},
            {"id": 1, "name": "west00", "target_map": 100, "target_portal": "east00"}
        ]}
    ]"#;

    #[test]
    fn test_portal_lookup_by_name_and_id() {
        let registry = MapRegistry::from_json_str(MAPS).unwrap();
        let town = registry.map(100).unwrap();

        assert_eq!(town.portal("east00").map(|p| p.id), Some(1));
        assert_eq!(town.portal_by_id(2).map(|p| p.name.as_str()), Some("tp"));
        assert!(town.portal("nowhere").is_none());
        assert!(town.portal_by_id(9).is_none());
    }

    #[test]
    fn test_destination() {
        let registry = MapRegistry::from_json_str(MAPS).unwrap();
        let town = registry.map(100).unwrap();

        assert_eq!(town.portal("sp").unwrap().destination(100), None);
        assert_eq!(town.portal("east00").unwrap().destination(100), Some(200));
        // pointing at the current map is an in-map teleport
        assert_eq!(town.portal("tp").unwrap().destination(100), None);
    }

    #[test]
    fn test_landing_portal_falls_back_to_spawn() {
        let registry = MapRegistry::from_json_str(MAPS).unwrap();
        let field = registry.map(200).unwrap();

        assert_eq!(field.landing_portal("west00").unwrap().id, 1);
        assert_eq!(field.landing_portal("missing").unwrap().id, 0);
    }

    #[test]
    fn test_spawn_portal_without_portals() {
        let map = Map {
            id: 1,
            name: String::new(),
            portals: Vec::new(),
        };
        let spawn = map.spawn_portal();
        assert_eq!((spawn.id, spawn.x, spawn.y), (0, 0, 0));
    }

    #[test]
    fn test_unknown_map() {
        let registry = MapRegistry::from_json_str(MAPS).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.map(300).is_none());
    }
}
