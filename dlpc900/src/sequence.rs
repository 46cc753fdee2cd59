/*!
Pattern sequence upload.

A sequence of single-bit patterns is stored on the controller as image
groups: each group is one compressed bitmap holding up to 24 bit-planes, and
each LUT entry points at a group and a bit position inside it. Uploading a
sequence:

1. stops any running sequence,
2. encodes every group of up to 24 planes and defines one LUT entry per pattern,
3. configures LUT playback (pattern count and repeat count),
4. declares and bulk-loads every group image, last group first.

The upload is not transactional. If a step fails the controller keeps
whatever was already sent; nothing is rolled back.
*/

use crate::device::Dmd;
use crate::error::{DmdError, Result};
use crate::pattern::PatternLutEntry;
use crate::protocol::{BIT_PLANES_PER_IMAGE, MAX_PATTERNS};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Compresses a batch of up to 24 bit-planes into one device-loadable image
pub trait BitmapEncoder {
    /// One single-bit image plane
    type Plane;

    /// Encode `planes` into the bytes to load; the byte count is the length
    fn encode(&self, planes: &[Self::Plane]) -> Result<Vec<u8>>;
}

/// Per-pattern timing and trigger settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternTiming {
    pub exposure_us: u32,
    pub wait_for_trigger: bool,
    pub dark_time_us: u32,
    pub disable_trigger2_out: bool,
}

/// A run of consecutive patterns sharing one stored image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageGroup<'a, P> {
    pub index: u16,
    pub first_pattern: usize,
    pub planes: &'a [P],
}

/// Partition `planes` into groups of at most 24
pub fn image_groups<P>(planes: &[P]) -> Vec<ImageGroup<'_, P>> {
    planes
        .chunks(BIT_PLANES_PER_IMAGE)
        .enumerate()
        .map(|(i, planes)| ImageGroup {
            index: i as u16,
            first_pattern: i * BIT_PLANES_PER_IMAGE,
            planes,
        })
        .collect()
}

/// LUT entry for one pattern of an uploaded sequence
pub fn sequence_entry(pattern_index: usize, group_index: u16, bit_position: u8, timing: &PatternTiming) -> PatternLutEntry {
    PatternLutEntry {
        pattern_index: pattern_index as u16,
        exposure_us: timing.exposure_us,
        dark_time_us: timing.dark_time_us,
        bit_depth: 1,
        color_channels: 0b111,
        clear_after_exposure: true,
        wait_for_trigger: timing.wait_for_trigger,
        disable_trigger2_out: timing.disable_trigger2_out,
        extended_bit_depth: false,
        image_group_index: group_index,
        bit_position,
    }
}

impl<T: Transport> Dmd<T> {
    /// Upload a pattern sequence and configure it to play `repeat` times (0 = forever)
    ///
    /// `timings[i]` applies to `planes[i]`. Inputs are checked before anything
    /// is sent.
    pub fn upload_sequence<E: BitmapEncoder>(
        &mut self,
        encoder: &E,
        planes: &[E::Plane],
        timings: &[PatternTiming],
        repeat: u32,
    ) -> Result<()> {
        if planes.is_empty() {
            return Err(DmdError::invalid_parameter("a sequence needs at least one pattern"));
        }
        if planes.len() != timings.len() {
            return Err(DmdError::invalid_parameter(format!(
                "{} patterns but {} timings",
                planes.len(),
                timings.len()
            )));
        }
        if planes.len() > MAX_PATTERNS {
            return Err(DmdError::invalid_parameter(format!(
                "{} patterns exceed the LUT capacity of {}",
                planes.len(),
                MAX_PATTERNS
            )));
        }

        self.stop_pattern()?;

        let groups = image_groups(planes);
        info!("🧩 Uploading {} patterns in {} image group(s)", planes.len(), groups.len());

        let mut images = Vec::with_capacity(groups.len());
        for group in &groups {
            let image = encoder.encode(group.planes)?;
            info!("Encoded group {} into {} bytes", group.index, image.len());

            for bit_position in 0..group.planes.len() {
                let pattern = group.first_pattern + bit_position;
                let entry = sequence_entry(pattern, group.index, bit_position as u8, &timings[pattern]);
                self.define_pattern(&entry)?;
                self.upload_checkpoint()?;
            }
            images.push(image);
        }

        self.configure_lut(planes.len(), repeat)?;

        for (group, image) in groups.iter().zip(&images).rev() {
            info!("📤 Loading image group {} ({} bytes)", group.index, image.len());
            self.declare_image(group.index, image.len())?;
            self.upload_checkpoint()?;
            self.load_image(image)?;
        }

        info!("✅ Sequence upload complete");
        Ok(())
    }
}
