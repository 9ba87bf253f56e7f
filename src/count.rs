//! Uniform count calculation under the 32-bit displacement ceiling.

use log::debug;

/// Adjust a desired per-rank element count so the resulting table stays safe.
///
/// Displacements are carried as 32-bit signed element offsets, so the largest
/// offset in a uniform table — `adjusted * num_ranks` — must not exceed
/// `i32::MAX`. The desired count is rounded to the nearest multiple of
/// `alignment` without crossing that ceiling and never below `alignment`
/// itself; when the naive product would overflow, the count shrinks rather
/// than failing.
///
/// Pure function. `num_ranks >= 1` and `alignment >= 1` are caller
/// preconditions.
pub fn calc_uniform_count(
    element_size: usize,
    desired_count: usize,
    num_ranks: usize,
    alignment: usize,
) -> usize {
    debug_assert!(num_ranks >= 1);
    debug_assert!(alignment >= 1);

    let ceiling = i32::MAX as usize / num_ranks;
    let capped = desired_count.min(ceiling);

    // Round to the nearest alignment multiple, falling back one step when
    // rounding up would cross the ceiling.
    let nearest = (capped + alignment / 2) / alignment * alignment;
    let mut adjusted = if nearest > ceiling {
        nearest - alignment
    } else {
        nearest
    };
    // Small desired counts must not round below one alignment unit; an
    // adjusted count of 0 would plan an empty table.
    if adjusted < alignment && alignment <= ceiling {
        adjusted = alignment;
    }

    debug!(
        "calc_uniform_count: desired {} -> adjusted {} ({} ranks x {} B = {} B payload)",
        desired_count,
        adjusted,
        num_ranks,
        element_size,
        adjusted * num_ranks * element_size
    );
    adjusted
}
