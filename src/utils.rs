//! Coil packing and formatting helpers.
//!
//! Modbus transfers coil states packed eight to a byte, least significant bit
//! first: coil `n` of a request lives in byte `n / 8`, bit `n % 8`. Unused high
//! bits of the last byte are zero.
//!
//! # Example
//!
//! ```
//! use htcpcp_gateway::utils::{pack_coils, unpack_coils, format_coils};
//!
//! let packed = pack_coils(&[true, false, true]);
//! assert_eq!(packed, vec![0b0000_0101]);
//!
//! let coils = unpack_coils(&packed, 3);
//! assert_eq!(coils, vec![true, false, true]);
//!
//! assert_eq!(format_coils(&coils), "101");
//! ```

/// Number of bytes needed to carry `count` packed coils.
///
/// # Example
///
/// ```
/// use htcpcp_gateway::utils::coil_byte_count;
///
/// assert_eq!(coil_byte_count(1), 1);
/// assert_eq!(coil_byte_count(8), 1);
/// assert_eq!(coil_byte_count(9), 2);
/// ```
pub fn coil_byte_count(count: usize) -> usize {
    count.div_ceil(8)
}

/// Packs coil states into bytes, LSB first.
pub fn pack_coils(coils: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; coil_byte_count(coils.len())];
    for (index, _) in coils.iter().enumerate().filter(|(_, on)| **on) {
        bytes[index / 8] |= 1 << (index % 8);
    }
    bytes
}

/// Unpacks the first `count` coil states from packed bytes.
///
/// Coils beyond the supplied bytes read as `false`.
pub fn unpack_coils(bytes: &[u8], count: usize) -> Vec<bool> {
    (0..count)
        .map(|index| {
            bytes
                .get(index / 8)
                .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
        })
        .collect()
}

/// Formats coil states as a string of `1`/`0` in address order.
pub fn format_coils(coils: &[bool]) -> String {
    coils.iter().map(|on| if *on { '1' } else { '0' }).collect()
}
