//! LEB128 varints, as used for address prefixes and extra-field counts.

/// Appends `value` to `out` as a varint.
pub fn write(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Reads a varint from the start of `data`, returning the value and the
/// number of bytes consumed. `None` on truncation or overflow.
pub fn read(data: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, byte) in data.iter().enumerate() {
        let shift = 7 * i as u32;
        if shift >= 64 {
            return None;
        }
        let chunk = u64::from(byte & 0x7f);
        if shift > 0 && chunk >> (64 - shift) != 0 {
            return None;
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
    }
    None
}
