use log::trace;

use super::frame::{BlockRegion, FRAME_CHANNELS, Frame};

/// Displacement of a block relative to its position in the reference frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionVector {
    pub dx: i32,
    pub dy: i32,
}

/// Offset applied to each component so it fits an unsigned 8-bit field.
pub const MV_OFFSET: i32 = 128;

/// Sum of absolute differences over all channels between `block` of
/// `current` and the same-sized block of `reference` at `(rx, ry)`.
pub fn block_sad(current: &Frame, reference: &Frame, block: BlockRegion, rx: usize, ry: usize) -> u64 {
    let mut sad = 0u64;
    for c in 0..FRAME_CHANNELS {
        for j in 0..block.height {
            for i in 0..block.width {
                let a = current.get(c, block.x + i, block.y + j) as i32;
                let b = reference.get(c, rx + i, ry + j) as i32;
                sad += a.abs_diff(b) as u64;
            }
        }
    }
    sad
}

/// Exhaustive block matching within `±search_range`.
///
/// Only candidates lying entirely inside the reference frame are considered.
/// `dy` is the outer loop and `dx` the inner one; a candidate replaces the
/// best one only when its SAD is strictly smaller.
pub fn find_motion_vector(
    current: &Frame,
    reference: &Frame,
    block: BlockRegion,
    search_range: u8,
) -> MotionVector {
    let range = search_range as i32;
    let max_x = (reference.width() - block.width) as i32;
    let max_y = (reference.height() - block.height) as i32;

    let mut best = MotionVector::default();
    let mut best_sad = u64::MAX;

    for dy in -range..=range {
        let ry = block.y as i32 + dy;
        if ry < 0 || ry > max_y {
            continue;
        }
        for dx in -range..=range {
            let rx = block.x as i32 + dx;
            if rx < 0 || rx > max_x {
                continue;
            }
            let sad = block_sad(current, reference, block, rx as usize, ry as usize);
            if sad < best_sad {
                best_sad = sad;
                best = MotionVector { dx, dy };
            }
        }
    }

    trace!(
        "block ({}, {}): mv ({}, {}), sad {best_sad}",
        block.x, block.y, best.dx, best.dy
    );
    best
}

/// Top-left corner of the reference block for `mv`, kept inside the frame.
pub fn reference_origin(reference: &Frame, block: BlockRegion, mv: MotionVector) -> (usize, usize) {
    let max_x = (reference.width() - block.width) as i32;
    let max_y = (reference.height() - block.height) as i32;
    let x = (block.x as i32 + mv.dx).clamp(0, max_x);
    let y = (block.y as i32 + mv.dy).clamp(0, max_y);
    (x as usize, y as usize)
}
