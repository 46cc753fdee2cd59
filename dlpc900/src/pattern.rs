/*!
Pattern look-up-table entries and image upload payloads.

A LUT entry is twelve bytes:

```text
byte  0-1   pattern index                     (LE16, 0..=399)
byte  2-4   exposure time in µs               (LE24)
byte  5     bit 0    clear after exposure
            bit 1-3  bit depth - 1
            bit 4-6  colour channels
            bit 7    wait for trigger
byte  6-8   dark time in µs                   (LE24)
byte  9     bit 0    disable trigger 2 output
            bit 1    extended bit depth
byte 10-11  image group index in bits 0-10,
            bit position in bits 11-15        (LE16)
```

[`PatternLutEntry::encode`] is the only place this layout is produced.
*/

use crate::bits::{fits_in_bits, pack, unpack, ByteOrder};
use crate::error::{DmdError, Result};
use crate::protocol::{BIT_PLANES_PER_IMAGE, BULK_CHUNK_SIZE, MAX_PATTERNS};
use serde::{Deserialize, Serialize};

/// Encoded size of one LUT entry
pub const LUT_ENTRY_SIZE: usize = 12;

const IMAGE_INDEX_BITS: u32 = 11;
const TIME_BITS: u32 = 24;

/// One pattern definition for the controller's playback LUT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternLutEntry {
    pub pattern_index: u16,
    pub exposure_us: u32,
    pub dark_time_us: u32,
    /// Bits per pixel, 1 to 8
    pub bit_depth: u8,
    /// Bitmask: 1 red, 2 green, 4 blue
    pub color_channels: u8,
    pub clear_after_exposure: bool,
    pub wait_for_trigger: bool,
    pub disable_trigger2_out: bool,
    pub extended_bit_depth: bool,
    pub image_group_index: u16,
    /// Which of the 24 bit-planes of the stored image to show
    pub bit_position: u8,
}

impl PatternLutEntry {
    /// Check every field against its wire width
    pub fn validate(&self) -> Result<()> {
        if self.pattern_index as usize >= MAX_PATTERNS {
            return Err(DmdError::invalid_parameter(format!(
                "pattern index {} out of range 0..{}",
                self.pattern_index, MAX_PATTERNS
            )));
        }
        if !fits_in_bits(self.exposure_us, TIME_BITS) {
            return Err(DmdError::invalid_parameter(format!(
                "exposure time {} µs does not fit in 24 bits",
                self.exposure_us
            )));
        }
        if !fits_in_bits(self.dark_time_us, TIME_BITS) {
            return Err(DmdError::invalid_parameter(format!(
                "dark time {} µs does not fit in 24 bits",
                self.dark_time_us
            )));
        }
        if !(1..=8).contains(&self.bit_depth) {
            return Err(DmdError::invalid_parameter(format!(
                "bit depth {} out of range 1..=8",
                self.bit_depth
            )));
        }
        if self.color_channels > 0b111 {
            return Err(DmdError::invalid_parameter(format!(
                "colour channel mask {} out of range 0..=7",
                self.color_channels
            )));
        }
        if !fits_in_bits(self.image_group_index, IMAGE_INDEX_BITS) {
            return Err(DmdError::invalid_parameter(format!(
                "image group index {} does not fit in 11 bits",
                self.image_group_index
            )));
        }
        if self.bit_position as usize >= BIT_PLANES_PER_IMAGE {
            return Err(DmdError::invalid_parameter(format!(
                "bit position {} out of range 0..{}",
                self.bit_position, BIT_PLANES_PER_IMAGE
            )));
        }
        Ok(())
    }

    /// Byte 5: clear flag, bit depth, colour channels and trigger-in flag
    pub fn options_byte(&self) -> u8 {
        (self.clear_after_exposure as u8)
            | ((self.bit_depth.wrapping_sub(1) & 0b111) << 1)
            | ((self.color_channels & 0b111) << 4)
            | ((self.wait_for_trigger as u8) << 7)
    }

    /// Byte 9: trigger-out and extended bit depth flags
    pub fn trigger_byte(&self) -> u8 {
        (self.disable_trigger2_out as u8) | ((self.extended_bit_depth as u8) << 1)
    }

    /// Bytes 10-11 as one 16-bit value: image index low, bit position high
    pub fn image_field(&self) -> u16 {
        (self.image_group_index & 0x07FF) | (((self.bit_position & 0x1F) as u16) << IMAGE_INDEX_BITS)
    }

    /// Encode the entry into its twelve wire bytes
    pub fn encode(&self) -> Result<[u8; LUT_ENTRY_SIZE]> {
        self.validate()?;

        let mut out = [0u8; LUT_ENTRY_SIZE];
        out[0..2].copy_from_slice(&pack(self.pattern_index, 2, ByteOrder::Little)?);
        out[2..5].copy_from_slice(&pack(self.exposure_us, 3, ByteOrder::Little)?);
        out[5] = self.options_byte();
        out[6..9].copy_from_slice(&pack(self.dark_time_us, 3, ByteOrder::Little)?);
        out[9] = self.trigger_byte();
        out[10..12].copy_from_slice(&pack(self.image_field(), 2, ByteOrder::Little)?);
        Ok(out)
    }

    /// Recover an entry from its wire bytes
    pub fn decode(bytes: &[u8; LUT_ENTRY_SIZE]) -> Result<Self> {
        let image_field = unpack(&bytes[10..12], ByteOrder::Little)? as u16;
        Ok(Self {
            pattern_index: unpack(&bytes[0..2], ByteOrder::Little)? as u16,
            exposure_us: unpack(&bytes[2..5], ByteOrder::Little)? as u32,
            dark_time_us: unpack(&bytes[6..9], ByteOrder::Little)? as u32,
            bit_depth: ((bytes[5] >> 1) & 0b111) + 1,
            color_channels: (bytes[5] >> 4) & 0b111,
            clear_after_exposure: bytes[5] & 0x01 != 0,
            wait_for_trigger: bytes[5] & 0x80 != 0,
            disable_trigger2_out: bytes[9] & 0x01 != 0,
            extended_bit_depth: bytes[9] & 0x02 != 0,
            image_group_index: image_field & 0x07FF,
            bit_position: (image_field >> IMAGE_INDEX_BITS) as u8,
        })
    }
}

/// Single-entry LUT shown in video-pattern mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoPatternLut {
    pub exposure_us: u32,
    pub dark_time_us: u32,
    /// 0 none, 1 red, 2 green, 3 red+green, 4 blue, 5 blue+red, 6 blue+green, 7 all
    pub color_channels: u8,
    pub bit_depth: u8,
}

impl Default for VideoPatternLut {
    fn default() -> Self {
        Self {
            exposure_us: 15_000,
            dark_time_us: 0,
            color_channels: 1,
            bit_depth: 8,
        }
    }
}

impl VideoPatternLut {
    pub fn to_entry(&self) -> PatternLutEntry {
        PatternLutEntry {
            pattern_index: 0,
            exposure_us: self.exposure_us,
            dark_time_us: self.dark_time_us,
            bit_depth: self.bit_depth,
            color_channels: self.color_channels,
            clear_after_exposure: false,
            wait_for_trigger: false,
            disable_trigger2_out: true,
            extended_bit_depth: false,
            image_group_index: 0,
            bit_position: 0,
        }
    }
}

/// Payload of the LUT playback configuration command (0x1A31)
///
/// A `repeat` of 0 plays the sequence forever.
pub fn lut_config_payload(pattern_count: usize, repeat: u32) -> Result<Vec<u8>> {
    if pattern_count == 0 || pattern_count > MAX_PATTERNS {
        return Err(DmdError::invalid_parameter(format!(
            "pattern count {} out of range 1..={}",
            pattern_count, MAX_PATTERNS
        )));
    }

    let mut payload = pack(pattern_count as u16, 2, ByteOrder::Little)?;
    payload.extend(pack(repeat, 4, ByteOrder::Little)?);
    Ok(payload)
}

/// Payload of the image slot declaration command (0x1A2A)
pub fn image_slot_payload(group_index: u16, byte_count: usize) -> Result<Vec<u8>> {
    if !fits_in_bits(group_index, IMAGE_INDEX_BITS) {
        return Err(DmdError::invalid_parameter(format!(
            "image group index {} does not fit in 11 bits",
            group_index
        )));
    }
    let byte_count = u32::try_from(byte_count)
        .map_err(|_| DmdError::invalid_parameter(format!("image of {} bytes is too large", byte_count)))?;

    let mut payload = pack(group_index, 2, ByteOrder::Little)?;
    payload.extend(pack(byte_count, 4, ByteOrder::Little)?);
    Ok(payload)
}

/// Split an encoded image into bulk-load sub-chunks
///
/// There are always `len / 504 + 1` chunks: full 504-byte chunks followed by
/// one chunk holding the remainder, which is empty when the length is an
/// exact multiple of 504.
pub fn bulk_chunks(image: &[u8]) -> Vec<&[u8]> {
    let full = image.len() / BULK_CHUNK_SIZE;
    let mut chunks: Vec<&[u8]> = image.chunks_exact(BULK_CHUNK_SIZE).collect();
    chunks.push(&image[full * BULK_CHUNK_SIZE..]);
    chunks
}

/// Payload of one bulk-load command (0x1A2B): LE16 length, then the bytes
pub fn bulk_chunk_payload(chunk: &[u8]) -> Result<Vec<u8>> {
    if chunk.len() > BULK_CHUNK_SIZE {
        return Err(DmdError::invalid_parameter(format!(
            "bulk chunk of {} bytes exceeds {}",
            chunk.len(),
            BULK_CHUNK_SIZE
        )));
    }

    let mut payload = pack(chunk.len() as u16, 2, ByteOrder::Little)?;
    payload.extend_from_slice(chunk);
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> PatternLutEntry {
        PatternLutEntry {
            pattern_index: 0,
            exposure_us: 0,
            dark_time_us: 0,
            bit_depth: 1,
            color_channels: 0,
            clear_after_exposure: false,
            wait_for_trigger: false,
            disable_trigger2_out: false,
            extended_bit_depth: false,
            image_group_index: 0,
            bit_position: 0,
        }
    }

    #[test]
    fn test_entry_layout() {
        let e = PatternLutEntry {
            pattern_index: 0x0123,
            exposure_us: 0x0A0B0C,
            dark_time_us: 0x010203,
            bit_depth: 1,
            color_channels: 0b111,
            clear_after_exposure: true,
            wait_for_trigger: true,
            disable_trigger2_out: true,
            extended_bit_depth: false,
            image_group_index: 2,
            bit_position: 23,
        };

        assert_eq!(
            e.encode().unwrap(),
            [0x23, 0x01, 0x0C, 0x0B, 0x0A, 0b1111_0001, 0x03, 0x02, 0x01, 0x01, 0x02, 23 << 3]
        );
    }

    #[test]
    fn test_options_byte_fields() {
        let e = PatternLutEntry { bit_depth: 8, ..entry() };
        assert_eq!(e.options_byte(), 0b0000_1110);

        let e = PatternLutEntry { color_channels: 0b100, ..entry() };
        assert_eq!(e.options_byte(), 0b0100_0000);

        let e = PatternLutEntry { clear_after_exposure: true, ..entry() };
        assert_eq!(e.options_byte(), 0b0000_0001);

        let e = PatternLutEntry { wait_for_trigger: true, ..entry() };
        assert_eq!(e.options_byte(), 0b1000_0000);

        let e = PatternLutEntry { extended_bit_depth: true, ..entry() };
        assert_eq!(e.trigger_byte(), 0b0000_0010);
    }

    #[test]
    fn test_image_field_split() {
        let e = PatternLutEntry { image_group_index: 0x07FF, bit_position: 0, ..entry() };
        assert_eq!(e.encode().unwrap()[10..], [0xFF, 0x07]);

        let e = PatternLutEntry { image_group_index: 0x0105, bit_position: 5, ..entry() };
        assert_eq!(e.encode().unwrap()[10..], [0x05, 0x01 | (5 << 3)]);
    }

    #[test]
    fn test_entry_roundtrip_at_boundaries() {
        for bit_position in [0u8, 23] {
            for bit_depth in [1u8, 8] {
                for color_channels in 0..=7u8 {
                    let original = PatternLutEntry {
                        pattern_index: 399,
                        exposure_us: 0xFF_FFFF,
                        dark_time_us: 1,
                        bit_depth,
                        color_channels,
                        clear_after_exposure: color_channels % 2 == 0,
                        wait_for_trigger: bit_depth == 8,
                        disable_trigger2_out: bit_position == 0,
                        extended_bit_depth: bit_position == 23,
                        image_group_index: 16,
                        bit_position,
                    };
                    let decoded = PatternLutEntry::decode(&original.encode().unwrap()).unwrap();
                    assert_eq!(decoded, original);
                }
            }
        }
    }

    #[test]
    fn test_entry_validation() {
        assert!(PatternLutEntry { pattern_index: 400, ..entry() }.encode().is_err());
        assert!(PatternLutEntry { exposure_us: 0x100_0000, ..entry() }.encode().is_err());
        assert!(PatternLutEntry { dark_time_us: 0x100_0000, ..entry() }.encode().is_err());
        assert!(PatternLutEntry { bit_depth: 0, ..entry() }.encode().is_err());
        assert!(PatternLutEntry { bit_depth: 9, ..entry() }.encode().is_err());
        assert!(PatternLutEntry { color_channels: 8, ..entry() }.encode().is_err());
        assert!(PatternLutEntry { image_group_index: 2048, ..entry() }.encode().is_err());
        assert!(PatternLutEntry { bit_position: 24, ..entry() }.encode().is_err());
    }

    #[test]
    fn test_video_pattern_lut_entry() {
        let bytes = VideoPatternLut::default().to_entry().encode().unwrap();
        // 15000 µs = 0x003A98
        assert_eq!(&bytes[..5], &[0x00, 0x00, 0x98, 0x3A, 0x00]);
        assert_eq!(bytes[5], (7 << 1) | (1 << 4));
        assert_eq!(bytes[9], 0x01);
        assert_eq!(&bytes[10..], &[0x00, 0x00]);
    }

    #[test]
    fn test_lut_config_payload() {
        assert_eq!(lut_config_payload(48, 0).unwrap(), vec![48, 0, 0, 0, 0, 0]);
        assert_eq!(lut_config_payload(400, 0x0102).unwrap(), vec![0x90, 0x01, 0x02, 0x01, 0, 0]);
        assert!(lut_config_payload(0, 0).is_err());
        assert!(lut_config_payload(401, 0).is_err());
    }

    #[test]
    fn test_image_slot_payload() {
        assert_eq!(image_slot_payload(1, 1100).unwrap(), vec![0x01, 0x00, 0x4C, 0x04, 0x00, 0x00]);
        assert!(image_slot_payload(2048, 10).is_err());
    }

    #[test]
    fn test_bulk_chunks_1100_bytes() {
        let image = vec![0xAB; 1100];
        let sizes: Vec<usize> = bulk_chunks(&image).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![504, 504, 92]);
    }

    #[test]
    fn test_bulk_chunks_exact_multiple_ends_with_empty_chunk() {
        let image = vec![0x01; 1008];
        let sizes: Vec<usize> = bulk_chunks(&image).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![504, 504, 0]);

        let sizes: Vec<usize> = bulk_chunks(&image[..504]).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![504, 0]);

        let sizes: Vec<usize> = bulk_chunks(&[]).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![0]);
    }

    #[test]
    fn test_bulk_chunks_preserve_bytes() {
        let image: Vec<u8> = (0..1300u32).map(|i| (i % 256) as u8).collect();
        let joined: Vec<u8> = bulk_chunks(&image).concat();
        assert_eq!(joined, image);
    }

    #[test]
    fn test_bulk_chunk_payload() {
        let payload = bulk_chunk_payload(&[9u8; 92]).unwrap();
        assert_eq!(&payload[..2], &[92, 0]);
        assert_eq!(payload.len(), 94);

        let payload = bulk_chunk_payload(&[9u8; 504]).unwrap();
        assert_eq!(&payload[..2], &[0xF8, 0x01]);

        assert_eq!(bulk_chunk_payload(&[]).unwrap(), vec![0, 0]);
        assert!(bulk_chunk_payload(&[0u8; 505]).is_err());
    }
}
