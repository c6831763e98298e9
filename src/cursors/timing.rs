//! Contains [`TimingPlan`], the display order and delays of an animation.

use crate::{
    error::{DecodeError, Result},
    options::DecodeOptions,
};

use std::num::NonZeroU32;

/// Everything the ANI header and its timing chunks say about playback.
///
/// A static cursor is a plan of one step, see [`Self::single`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingPlan {
    /// Tick counts ("rate"), one per step or one per icon.
    pub rate: Option<Vec<u32>>,
    /// Per-step icon indices ("seq ").
    pub sequence: Option<Vec<u32>>,
    /// Ticks per step when there's no rate for it.
    pub jiffy: u32,
    /// Width every frame is coerced to, if declared.
    pub declared_width: Option<NonZeroU32>,
    /// Height every frame is coerced to, if declared.
    pub declared_height: Option<NonZeroU32>,
    /// Icon count claimed by the header. Informational.
    pub num_frames: u32,
    /// Step count claimed by the header. Informational.
    pub num_steps: u32,
}

impl TimingPlan {
    /// Plan for a static cursor: one step showing the only icon.
    #[must_use]
    pub fn single() -> Self {
        Self {
            num_frames: 1,
            num_steps: 1,
            ..Self::default()
        }
    }

    /// Icon index shown at each step.
    ///
    /// That's the sequence if there's a non-empty one,
    /// otherwise every icon once, in order.
    ///
    /// ## Errors
    ///
    /// If a sequence entry isn't below `icons`.
    pub fn steps(&self, icons: usize) -> Result<Vec<usize>> {
        let Some(sequence) = self.sequence.as_deref().filter(|s| !s.is_empty()) else {
            return Ok((0..icons).collect());
        };

        if self.num_steps as usize != sequence.len() {
            log::debug!(
                "header declares num_steps={}, sequence has {} step(s)",
                self.num_steps,
                sequence.len()
            );
        }

        sequence
            .iter()
            .enumerate()
            .map(|(step, &index)| {
                usize::try_from(index)
                    .ok()
                    .filter(|i| *i < icons)
                    .ok_or(DecodeError::InvalidSequenceIndex { step, index, icons })
            })
            .collect()
    }

    /// Display time of each step, in milliseconds.
    ///
    /// `steps` holds the icon shown at each step (see [`Self::steps`]),
    /// out of `icons` physical icons. The rate table is read per step
    /// when it has one entry per step, otherwise per icon when it covers
    /// every icon. Missing (or zero) entries fall back to [`Self::jiffy`].
    #[must_use]
    pub fn delays_ms(&self, steps: &[usize], icons: usize, options: &DecodeOptions) -> Vec<u32> {
        let rate = self.rate.as_deref().unwrap_or_default();
        let per_icon = rate.len() != steps.len() && !rate.is_empty() && rate.len() >= icons;

        if self.rate.is_some() && !per_icon && rate.len() < steps.len() {
            log::warn!(
                "rate table has {} entries for {} steps, using jiffy={} for the rest",
                rate.len(),
                steps.len(),
                self.jiffy
            );
        }

        steps
            .iter()
            .enumerate()
            .map(|(step, &icon)| {
                let entry = if per_icon { rate.get(icon) } else { rate.get(step) };

                let ticks = match entry {
                    Some(&ticks) if ticks != 0 => ticks,
                    _ => self.jiffy,
                };

                options.ticks_to_ms(ticks)
            })
            .collect()
    }
}
