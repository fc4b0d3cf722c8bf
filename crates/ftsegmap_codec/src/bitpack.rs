//! Fixed-width bitpacking helpers.
//!
//! Values are packed back to back at a fixed bit width, little-endian bit
//! order within the byte stream. Width 0 packs nothing (all values zero);
//! width 64 stores values verbatim.

/// Returns the number of bits needed to represent `max`.
#[must_use]
pub fn width_for(max: u64) -> u32 {
    64 - max.leading_zeros()
}

/// Returns the packed byte length of `count` values at `width` bits.
#[must_use]
pub fn packed_len(count: usize, width: u32) -> usize {
    (count * width as usize).div_ceil(8)
}

/// Appends `values` to `out`, each occupying exactly `width` bits.
///
/// Bits of each value above `width` are discarded; callers compute
/// `width` from the maximum value to avoid loss.
pub fn pack_into(values: &[u64], width: u32, out: &mut Vec<u8>) {
    if width == 0 {
        return;
    }

    let start = out.len();
    out.resize(start + packed_len(values.len(), width), 0);
    let buf = &mut out[start..];

    let mut bit = 0usize;
    for &v in values {
        let masked = if width == 64 {
            v
        } else {
            v & ((1u64 << width) - 1)
        };

        let mut acc = u128::from(masked) << (bit % 8);
        let mut byte = bit / 8;
        while acc != 0 {
            buf[byte] |= (acc & 0xFF) as u8;
            acc >>= 8;
            byte += 1;
        }
        bit += width as usize;
    }
}

/// Extracts the value at `index` from a packed byte run.
///
/// Returns `None` if the read would run past `bytes`.
#[must_use]
pub fn unpack_at(bytes: &[u8], width: u32, index: usize) -> Option<u64> {
    if width == 0 {
        return Some(0);
    }

    let start_bit = index as u128 * u128::from(width);
    let start_byte = (start_bit / 8) as usize;
    let end_byte = ((start_bit + u128::from(width)).div_ceil(8)) as usize;
    if end_byte > bytes.len() {
        return None;
    }

    let mut acc: u128 = 0;
    for (i, &b) in bytes[start_byte..end_byte].iter().enumerate() {
        acc |= u128::from(b) << (8 * i);
    }

    let shifted = (acc >> (start_bit % 8)) as u64;
    Some(if width == 64 {
        shifted
    } else {
        shifted & ((1u64 << width) - 1)
    })
}
