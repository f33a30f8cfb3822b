//! Numeric helpers shared by the expansion model and the animation driver.

/// Linear interpolation between `start` and `stop`.
///
/// The result is not clamped; `amount` outside 0..=1 extrapolates.
pub fn lerp(start: f32, stop: f32, amount: f32) -> f32 {
    start + (stop - start) * amount
}

/// Clamp `value` to `[low, high]`.
pub fn constrain(value: f32, low: f32, high: f32) -> f32 {
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}

/// Decelerating ease-out curve, `1 - (1 - t)²`.
///
/// This is the single interpolation curve shared by every scrim animation.
pub fn decelerate(input: f32) -> f32 {
    1.0 - (1.0 - input) * (1.0 - input)
}

/// Format a duration compactly for log output ("220ms", "1.5s").
pub fn format_duration(duration: std::time::Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}
