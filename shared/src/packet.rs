//! Little-endian packet cursor and builder used on both sides of the wire
//!
//! Every inbound message is a 2-byte opcode followed by typed fields. The
//! reader hands out those fields one at a time and fails with
//! [`DecodeError`] on a short read, so a truncated message never produces
//! half-decoded state.

use thiserror::Error;

/// Failure while pulling a field out of an inbound message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of packet: wanted {wanted} bytes, {remaining} remaining")]
    UnexpectedEof { wanted: usize, remaining: usize },
    #[error("string field is not valid utf-8")]
    InvalidString,
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Read cursor over a received message
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn read_bytes(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof {
                wanted: len,
                remaining: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..start + len])
    }

    fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> DecodeResult<i8> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> DecodeResult<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> DecodeResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> DecodeResult<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Reads a u16 length-prefixed string. On failure the cursor stays
    /// before the length prefix.
    pub fn read_string(&mut self) -> DecodeResult<String> {
        let start = self.pos;
        let result = self.read_u16().and_then(|len| {
            let bytes = self.read_bytes(len as usize)?;
            String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidString)
        });
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    pub fn skip(&mut self, len: usize) -> DecodeResult<()> {
        self.read_bytes(len).map(|_| ())
    }
}

/// Outbound message buffer, always starting with its opcode
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PacketWriter {
    data: Vec<u8>,
}

impl PacketWriter {
    pub fn new(opcode: u16) -> Self {
        let mut writer = Self {
            data: Vec::with_capacity(64),
        };
        writer.write_u16(opcode);
        writer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a u16 length-prefixed string, truncating past `u16::MAX` bytes
    pub fn write_string(&mut self, value: &str) {
        let bytes = value.as_bytes();
        let len = bytes.len().min(u16::MAX as usize);
        self.write_u16(len as u16);
        self.write_bytes(&bytes[..len]);
    }

    /// Writes `value` into a fixed-width zero-padded field
    pub fn write_padded_string(&mut self, value: &str, width: usize) {
        let bytes = value.as_bytes();
        let len = bytes.len().min(width);
        self.write_bytes(&bytes[..len]);
        self.data.resize(self.data.len() + (width - len), 0);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_starts_with_opcode() {
        let writer = PacketWriter::new(0x1234);
        assert_eq!(writer.as_slice(), &[0x34, 0x12]);
    }

    #[test]
    fn test_signed_fields_are_little_endian() {
        let mut writer = PacketWriter::new(0);
        writer.write_i32(-1);
        writer.write_i16(-2);
        writer.write_i8(-3);

        let mut reader = PacketReader::new(writer.as_slice());
        assert_eq!(reader.read_u16(), Ok(0));
        assert_eq!(reader.read_i32(), Ok(-1));
        assert_eq!(reader.read_i16(), Ok(-2));
        assert_eq!(reader.read_i8(), Ok(-3));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_short_read_reports_sizes() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = PacketReader::new(&data);

        assert_eq!(
            reader.read_i32(),
            Err(DecodeError::UnexpectedEof {
                wanted: 4,
                remaining: 3
            })
        );
        // Failed reads do not advance the cursor
        assert_eq!(reader.read_u16(), Ok(0x0201));
    }

    #[test]
    fn test_string_with_truncated_body() {
        let data = [0x05, 0x00, b'a', b'b'];
        let mut reader = PacketReader::new(&data);
        assert!(matches!(
            reader.read_string(),
            Err(DecodeError::UnexpectedEof { wanted: 5, .. })
        ));
        // the length prefix is still unread
        assert_eq!(reader.remaining(), 4);
        assert_eq!(reader.read_u16(), Ok(5));
    }

    #[test]
    fn test_string_invalid_utf8() {
        let data = [0x02, 0x00, 0xff, 0xfe];
        let mut reader = PacketReader::new(&data);
        assert_eq!(reader.read_string(), Err(DecodeError::InvalidString));
        assert_eq!(reader.remaining(), 4);
    }

    #[test]
    fn test_padded_string() {
        let mut writer = PacketWriter::new(0);
        writer.write_padded_string("abcdef", 4);
        writer.write_padded_string("ab", 4);
        assert_eq!(
            &writer.as_slice()[2..],
            &[b'a', b'b', b'c', b'd', b'a', b'b', 0, 0]
        );
    }
}
