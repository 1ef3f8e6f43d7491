/// Splitting is needed only with a positive limit that the file exceeds.
#[must_use]
pub const fn needs_split(file_size: u64, max_size: u64) -> bool {
    max_size > 0 && file_size > max_size
}

/// Bits per second: the probed value when known, otherwise the file average.
/// Returns 0 when neither is usable.
#[must_use]
pub fn effective_bit_rate(probed_bit_rate: u64, file_size: u64, duration_seconds: f64) -> u64 {
    if probed_bit_rate > 0 {
        return probed_bit_rate;
    }
    if duration_seconds <= 0.0 || !duration_seconds.is_finite() {
        return 0;
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let estimated = (file_size as f64 * 8.0 / duration_seconds) as u64;
    estimated
}

/// Target seconds per segment so that one segment stays near `max_size`, at least 1.
#[must_use]
pub const fn segment_seconds(max_size: u64, bit_rate: u64) -> u64 {
    if bit_rate == 0 {
        return 1;
    }
    let seconds = max_size.saturating_mul(8) / bit_rate;
    if seconds < 1 { 1 } else { seconds }
}

/// Rough count for logging only; keyframe alignment makes the real count differ.
#[must_use]
pub fn expected_segment_count(duration_seconds: f64, segment_seconds: u64) -> u64 {
    if segment_seconds == 0 || duration_seconds <= 0.0 {
        return 0;
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = (duration_seconds / segment_seconds as f64).ceil() as u64;
    count
}
