use crate::packet::PacketWriter;
use serde::{Deserialize, Serialize};

/// Width of the zero-padded name field in the stats block
pub const NAME_FIELD_WIDTH: usize = 13;

/// Character stats as stored and as sent to the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterStats {
    pub id: i32,
    pub name: String,
    pub gender: u8,
    pub skin: u8,
    pub face: i32,
    pub hair: i32,
    pub level: u8,
    pub job: i16,
    pub str: i16,
    pub dex: i16,
    pub int: i16,
    pub luk: i16,
    pub hp: i16,
    pub max_hp: i16,
    pub mp: i16,
    pub max_mp: i16,
    pub ap: i16,
    pub sp: i16,
    pub exp: i32,
    pub fame: i16,
    pub map_id: i32,
    pub spawn_point: u8,
}

impl CharacterStats {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Appends the stats block to an outbound message
    pub fn encode(&self, p: &mut PacketWriter) {
        p.write_i32(self.id);
        p.write_padded_string(&self.name, NAME_FIELD_WIDTH);
        p.write_u8(self.gender);
        p.write_u8(self.skin);
        p.write_i32(self.face);
        p.write_i32(self.hair);
        // pet unique ids, no pets yet
        for _ in 0..3 {
            p.write_u64(0);
        }
        p.write_u8(self.level);
        p.write_i16(self.job);
        p.write_i16(self.str);
        p.write_i16(self.dex);
        p.write_i16(self.int);
        p.write_i16(self.luk);
        p.write_i16(self.hp);
        p.write_i16(self.max_hp);
        p.write_i16(self.mp);
        p.write_i16(self.max_mp);
        p.write_i16(self.ap);
        p.write_i16(self.sp);
        p.write_i32(self.exp);
        p.write_i16(self.fame);
        p.write_i32(self.map_id);
        p.write_u8(self.spawn_point);
    }
}
