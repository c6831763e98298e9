//! Turns decoded frames and a [`TimingPlan`] into a [`CursorArtifact`].

use super::{artifact::CursorArtifact, raw_frame::RawFrame, timing::TimingPlan};
use crate::{
    error::{DecodeError, Result},
    options::DecodeOptions,
};

use std::borrow::Cow;

/// Assembles `icons` (decoded once each, in file order) following `plan`.
///
/// - Frames are played in the order given by [`TimingPlan::steps`].
/// - The artifact takes the plan's declared size when there's one,
///   otherwise the first icon's size. Other sizes are coerced to it.
/// - The hotspot is the one of the last step's icon, clamped.
///
/// ## Errors
///
/// - [`DecodeError::NoImages`] if `icons` is empty.
/// - [`DecodeError::InvalidSequenceIndex`] for a bad sequence.
/// - [`DecodeError::ImageTooLarge`] if the declared size exceeds `options`.
/// - [`DecodeError::OutputTooLarge`] if the frames add up to too many pixels.
pub fn assemble(
    icons: &[RawFrame],
    plan: &TimingPlan,
    options: &DecodeOptions,
) -> Result<CursorArtifact> {
    let first = icons
        .first()
        .ok_or(DecodeError::NoImages("nothing to assemble"))?;

    let steps = plan.steps(icons.len())?;
    let (first_w, first_h) = first.dimensions();
    let width = plan.declared_width.map_or(first_w, u32::from);
    let height = plan.declared_height.map_or(first_h, u32::from);

    if steps.is_empty() {
        return Err(DecodeError::NoImages("animation has no steps"));
    }

    if width > options.max_dimension || height > options.max_dimension {
        return Err(DecodeError::ImageTooLarge {
            width,
            height,
            max: options.max_dimension,
        });
    }

    // coerced icons and assembled steps are both frame-sized
    let frame_len = width as usize * height as usize;
    let frames = steps.len().max(icons.len());

    if frame_len.saturating_mul(frames) > options.max_total_pixels {
        return Err(DecodeError::OutputTooLarge {
            frames,
            width,
            height,
            max: options.max_total_pixels,
        });
    }

    // coerce each icon at most once, repeated steps share it
    let sized: Vec<Cow<'_, RawFrame>> = icons
        .iter()
        .map(|icon| {
            if icon.dimensions() == (width, height) {
                Ok(Cow::Borrowed(icon))
            } else {
                log::warn!(
                    "coercing {:?} frame to {width}x{height}",
                    icon.dimensions()
                );
                icon.coerced_to(width, height).map(Cow::Owned)
            }
        })
        .collect::<Result<_>>()?;

    let mut pixels = Vec::with_capacity(frame_len * steps.len());

    for &step in &steps {
        // bottom row first
        for row in sized[step].rows().rev() {
            pixels.extend_from_slice(row);
        }
    }

    let last = &sized[steps[steps.len() - 1]];
    let (hx, hy) = last.hotspot().unwrap_or((0, height - 1));
    let hotspot = (hx.min(width - 1), hy.min(height - 1));

    if hotspot != (hx, hy) {
        log::warn!("hotspot=({hx}, {hy}) is outside of {width}x{height}, clamping");
    }

    let frame_count = u32::try_from(steps.len())
        .map_err(|_| DecodeError::InvalidFrame(format!("{} steps", steps.len())))?;

    let delays = (frame_count > 1).then(|| plan.delays_ms(&steps, icons.len(), options));

    log::debug!(
        "assembled {width}x{height} cursor, {frame_count} frame(s) from {} icon(s)",
        icons.len()
    );

    CursorArtifact::new((width, height), hotspot, frame_count, pixels, delays)
}

/// Assembles a static cursor out of one frame.
///
/// ## Errors
///
/// See [`assemble`].
pub fn assemble_static(frame: RawFrame, options: &DecodeOptions) -> Result<CursorArtifact> {
    assemble(&[frame], &TimingPlan::single(), options)
}
