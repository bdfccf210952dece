//! Builders for messages sent to the client

use crate::gamedata::Portal;
use crate::session::ActiveSession;
use shared::opcodes::outbound;
use shared::PacketWriter;

const CONNECT_BLOB: [u8; 8] = [0xF8, 0x17, 0xD7, 0x13, 0xCD, 0xC5, 0xAD, 0x78];
const CONNECT_MAGIC: [u8; 4] = [0xFF, 0xC9, 0x9A, 0x3B];
const CONNECT_MAGIC_REPEAT: usize = 15;

/// Broadcast message type for the scrolling header
const SCROLLING_HEADER: u8 = 4;

/// Initial character data, sent once when a player loads into the channel
pub fn connect_data(
    session: &ActiveSession,
    channel_id: i8,
    seed: i32,
    now_ms: i64,
) -> PacketWriter {
    let mut p = PacketWriter::new(outbound::WARP_TO_MAP);
    p.write_i32(channel_id as i32);
    p.write_u8(0x01);
    p.write_u8(0x01);
    p.write_u16(0x0000);
    p.write_i32(seed);
    p.write_bytes(&CONNECT_BLOB);
    p.write_i64(-1);

    session.stats.encode(&mut p);

    p.write_u8(session.buddylist_size);
    p.write_i32(session.meso);
    for slots in session.inventory_slots {
        p.write_u8(slots);
    }

    // inventories are zero-terminated lists: equipped, then the five tabs
    p.write_u16(0x0000);
    for _ in 0..5 {
        p.write_u8(0x00);
    }

    p.write_u16(0x0000); // skills
    p.write_u16(0x0000); // quests
    p.write_u64(0); // rings

    for _ in 0..CONNECT_MAGIC_REPEAT {
        p.write_bytes(&CONNECT_MAGIC);
    }

    p.write_u32(0);
    p.write_i64(now_ms);
    p
}

pub fn scrolling_header(message: &str) -> PacketWriter {
    let mut p = PacketWriter::new(outbound::BROADCAST_MESSAGE);
    p.write_u8(SCROLLING_HEADER);
    p.write_u8(0x01);
    p.write_string(message);
    p
}

/// Gives control back to a client that is waiting on a transition
pub fn enable_actions() -> PacketWriter {
    let mut p = PacketWriter::new(outbound::STATS_UPDATE);
    p.write_u8(0x01);
    p.write_u32(0); // empty stat mask
    p
}

/// Moves the client's view to another map
pub fn warp_to_map(
    channel_id: i8,
    map_id: i32,
    portal_id: u8,
    hp: i16,
    now_ms: i64,
) -> PacketWriter {
    let mut p = PacketWriter::new(outbound::WARP_TO_MAP);
    p.write_i32(channel_id as i32);
    p.write_u8(0x00);
    p.write_u8(0x00);
    p.write_i32(map_id);
    p.write_u8(portal_id);
    p.write_i16(hp);
    p.write_u8(0x00);
    p.write_i64(now_ms);
    p
}

/// Teleports the character to a portal inside the current map
pub fn portal_enter(portal: &Portal) -> PacketWriter {
    let mut p = PacketWriter::new(outbound::PORTAL_ENTER);
    p.write_u8(portal.id);
    p.write_i16(portal.x);
    p.write_i16(portal.y);
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::test_session;
    use shared::PacketReader;

    #[test]
    fn test_connect_data_layout() {
        let mut session = test_session(0, 100);
        session.meso = 777;
        session.buddylist_size = 25;
        let p = connect_data(&session, 3, 0x1234, 1_700_000_000_000);

        let mut r = PacketReader::new(p.as_slice());
        assert_eq!(r.read_u16(), Ok(outbound::WARP_TO_MAP));
        assert_eq!(r.read_i32(), Ok(3));
        assert_eq!(r.read_u8(), Ok(1));
        assert_eq!(r.read_u8(), Ok(1));
        assert_eq!(r.read_u16(), Ok(0));
        assert_eq!(r.read_i32(), Ok(0x1234));
        assert_eq!(r.read_bytes(8), Ok(&CONNECT_BLOB[..]));
        assert_eq!(r.read_i64(), Ok(-1));

        let mut stats = PacketWriter::new(0);
        session.stats.encode(&mut stats);
        let stats_len = stats.len() - 2;
        assert_eq!(r.read_bytes(stats_len), Ok(&stats.as_slice()[2..]));

        assert_eq!(r.read_u8(), Ok(25));
        assert_eq!(r.read_i32(), Ok(777));
        assert_eq!(r.read_bytes(5), Ok(&[100u8; 5][..]));

        // inventories, skills, quests, rings
        assert_eq!(r.read_bytes(2 + 5 + 2 + 2 + 8).map(|b| b.iter().all(|&x| x == 0)), Ok(true));
        for _ in 0..CONNECT_MAGIC_REPEAT {
            assert_eq!(r.read_bytes(4), Ok(&CONNECT_MAGIC[..]));
        }
        assert_eq!(r.read_u32(), Ok(0));
        assert_eq!(r.read_i64(), Ok(1_700_000_000_000));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_scrolling_header() {
        let p = scrolling_header("Hello");
        let mut r = PacketReader::new(p.as_slice());
        assert_eq!(r.read_u16(), Ok(outbound::BROADCAST_MESSAGE));
        assert_eq!(r.read_u8(), Ok(SCROLLING_HEADER));
        assert_eq!(r.read_u8(), Ok(1));
        assert_eq!(r.read_string().as_deref(), Ok("Hello"));
    }

    #[test]
    fn test_enable_actions() {
        assert_eq!(
            enable_actions().as_slice(),
            &[0x1C, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_warp_identifies_destination() {
        let p = warp_to_map(2, 5, 3, 40, 99);
        let mut r = PacketReader::new(p.as_slice());
        r.skip(2 + 4 + 2).unwrap();
        assert_eq!(r.read_i32(), Ok(5));
        assert_eq!(r.read_u8(), Ok(3));
        assert_eq!(r.read_i16(), Ok(40));
    }
}
