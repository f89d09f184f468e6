//! Conversion between a flat point total and level + progress.
//!
//! The curve has three quadratic pieces joined at levels 15/16 and 30/31.
//! Every level costs `points_to_next_level(level)` points, so
//! `points_at_level(l + 1) - points_at_level(l) == points_to_next_level(l)`
//! holds across the joins.

use crate::host::{HostError, ProgressionMut};

/// Largest point total handled. Larger inputs are clamped.
pub const MAX_POINTS: i64 = i32::MAX as i64;

// largest f32 strictly below 1.0
const BELOW_ONE: f32 = 1.0 - f32::EPSILON / 2.0;

/// Total points needed to reach `level` from zero.
pub fn points_at_level(level: u32) -> i64 {
    let l = i64::from(level);
    let sq = l.saturating_mul(l);
    if level > 30 {
        // 4.5l² - 162.5l + 2220
        (sq.saturating_mul(9) - 325 * l + 4440) / 2
    } else if level > 15 {
        // 2.5l² - 40.5l + 360
        (sq * 5 - 81 * l + 720) / 2
    } else {
        sq + 6 * l
    }
}

/// Points between `level` and `level + 1`.
pub fn points_to_next_level(level: u32) -> i64 {
    let l = i64::from(level);
    if level >= 30 {
        9 * l - 158
    } else if level >= 15 {
        5 * l - 38
    } else {
        2 * l + 7
    }
}

/// Level and fractional progress for a point total.
///
/// Negative totals count as zero. `progress` is always in `[0, 1)`.
pub fn level_from_points(points: i64) -> (u32, f32) {
    let points = points.clamp(0, MAX_POINTS);

    // the closed forms can land one level off when the square root is exact
    let mut level = estimate_level(points);
    while level > 0 && points_at_level(level) > points {
        level -= 1;
    }
    while points_at_level(level + 1) <= points {
        level += 1;
    }

    let into_level = (points - points_at_level(level)) as f64;
    let progress = (into_level / points_to_next_level(level) as f64) as f32;

    (level, progress.min(BELOW_ONE))
}

fn estimate_level(points: i64) -> u32 {
    let p = points as f64;
    let estimate = if points > 1395 {
        ((72.0 * p - 54215.0).sqrt() + 325.0) / 18.0
    } else if points > 315 {
        (40.0 * p - 7839.0).sqrt() / 10.0 + 8.1
    } else if points > 0 {
        (p + 9.0).sqrt() - 3.0
    } else {
        0.0
    };

    estimate.floor() as u32
}

/// Point total for a level and progress, the inverse of [`level_from_points`].
pub fn total_points(level: u32, progress: f32) -> i64 {
    let progress = if progress.is_nan() {
        0.0
    } else {
        f64::from(progress.clamp(0.0, 1.0))
    };
    let partial = (points_to_next_level(level) as f64 * progress).round() as i64;

    points_at_level(level).saturating_add(partial)
}

/// Set `target`'s level and progress from a point total.
///
/// Negative totals are clamped to zero. Exactly one level write and one
/// progress write reach the target.
pub fn apply_points<T: ProgressionMut + ?Sized>(target: &mut T, points: i64) -> Result<(), HostError> {
    let (level, progress) = level_from_points(points.max(0));
    target.set_level(level)?;
    target.set_progress(progress)?;
    Ok(())
}
