/*!
Fixed-width integer packing.

Every multi-byte field in the DLPC900 protocol (lengths, command codes,
exposure times, image sizes) is an unsigned integer laid out in a fixed number
of bytes, almost always little-endian. This module holds the one routine that
does that layout, plus the bit accessors used by the status decoders.
*/

use crate::error::{DmdError, Result};
use num_traits::{PrimInt, Unsigned};

/// Byte order of a packed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Check that `value` can be represented in `bits` bits
pub fn fits_in_bits<T: PrimInt + Unsigned>(value: T, bits: u32) -> bool {
    let width = T::zero().count_zeros();
    width - value.leading_zeros() <= bits
}

/// Pack `value` into exactly `width` bytes
///
/// Fails with [`DmdError::InvalidParameter`] when the value does not fit.
pub fn pack<T: PrimInt + Unsigned>(value: T, width: usize, order: ByteOrder) -> Result<Vec<u8>> {
    let wide = value
        .to_u64()
        .ok_or_else(|| DmdError::invalid_parameter("value does not fit in 64 bits"))?;

    if width > 8 || !fits_in_bits(wide, (width * 8) as u32) {
        return Err(DmdError::invalid_parameter(format!(
            "value {} does not fit in {} byte(s)",
            wide, width
        )));
    }

    let mut bytes = wide.to_le_bytes()[..width].to_vec();
    if order == ByteOrder::Big {
        bytes.reverse();
    }
    Ok(bytes)
}

/// Reassemble an unsigned integer from up to eight bytes
pub fn unpack(bytes: &[u8], order: ByteOrder) -> Result<u64> {
    if bytes.len() > 8 {
        return Err(DmdError::invalid_parameter(format!(
            "cannot unpack {} bytes into a 64-bit value",
            bytes.len()
        )));
    }

    let fold = |acc: u64, &byte: &u8| (acc << 8) | byte as u64;
    Ok(match order {
        ByteOrder::Little => bytes.iter().rev().fold(0, fold),
        ByteOrder::Big => bytes.iter().fold(0, fold),
    })
}

/// Read bit `n` of `byte`, where bit 0 is the least significant
pub fn bit(byte: u8, n: u8) -> bool {
    (byte >> n) & 1 != 0
}

/// The lowest `count` bits of `byte`, least significant first
pub fn bits_lsb_first(byte: u8, count: u8) -> Vec<bool> {
    (0..count.min(8)).map(|n| bit(byte, n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_byte_orders() {
        assert_eq!(pack(0x123456u32, 3, ByteOrder::Little).unwrap(), vec![0x56, 0x34, 0x12]);
        assert_eq!(pack(0x123456u32, 3, ByteOrder::Big).unwrap(), vec![0x12, 0x34, 0x56]);
        assert_eq!(pack(0x1A1Bu16, 2, ByteOrder::Little).unwrap(), vec![0x1B, 0x1A]);
        assert_eq!(pack(0u8, 4, ByteOrder::Little).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_pack_rejects_overflow() {
        assert!(pack(0x0100_0000u32, 3, ByteOrder::Little).is_err());
        assert!(pack(0x00FF_FFFFu32, 3, ByteOrder::Little).is_ok());
        assert!(pack(1u8, 9, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_unpack() {
        assert_eq!(unpack(&[0x56, 0x34, 0x12], ByteOrder::Little).unwrap(), 0x123456);
        assert_eq!(unpack(&[0x12, 0x34, 0x56], ByteOrder::Big).unwrap(), 0x123456);
        assert_eq!(unpack(&[], ByteOrder::Little).unwrap(), 0);
        assert!(unpack(&[0; 9], ByteOrder::Big).is_err());

        let packed = pack(0xDEAD_BEEFu32, 4, ByteOrder::Little).unwrap();
        assert_eq!(unpack(&packed, ByteOrder::Little).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_fits_in_bits() {
        assert!(fits_in_bits(399u16, 16));
        assert!(fits_in_bits(2047u16, 11));
        assert!(!fits_in_bits(2048u16, 11));
        assert!(fits_in_bits(23u8, 5));
        assert!(!fits_in_bits(32u8, 5));
        assert!(fits_in_bits(0u32, 0));
        assert!(fits_in_bits(u64::MAX, 64));
    }

    #[test]
    fn test_bit_access() {
        assert!(bit(0b0000_0001, 0));
        assert!(!bit(0b0000_0001, 7));
        assert!(bit(0b1000_0000, 7));
        assert_eq!(
            bits_lsb_first(0b0010_0101, 6),
            vec![true, false, true, false, false, true]
        );
    }
}
