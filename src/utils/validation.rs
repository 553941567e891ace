use crate::processing::Rect;
use crate::utils::{BridgeError, BridgeResult};

/// Largest channel count accepted from a raw frame buffer.
pub const MAX_FRAME_CHANNELS: usize = 4;

/// Checks that a raw interleaved frame holds exactly `rows * cols * channels`
/// bytes.
pub fn validate_frame(rows: usize, cols: usize, channels: usize, len: usize) -> BridgeResult<()> {
    if channels == 0 || channels > MAX_FRAME_CHANNELS {
        return Err(BridgeError::unsupported(format!(
            "Frame channel count must be 1..={MAX_FRAME_CHANNELS}, got {channels}"
        )));
    }
    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| BridgeError::unsupported(format!("Frame of {rows}x{cols}x{channels} is too large")))?;
    if expected != len {
        return Err(BridgeError::unsupported(format!(
            "Frame of {rows}x{cols}x{channels} needs {expected} bytes, got {len}"
        )));
    }
    Ok(())
}

/// A region must have a non-negative extent to be materialized.
pub fn validate_region(rect: &Rect) -> BridgeResult<()> {
    if rect.width < 0 || rect.height < 0 {
        return Err(BridgeError::processing(format!(
            "Region has negative size {}x{}",
            rect.width, rect.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_length_must_match_shape() {
        assert!(validate_frame(2, 3, 4, 24).is_ok());
        assert!(matches!(
            validate_frame(2, 3, 4, 23),
            Err(BridgeError::UnsupportedInput(_))
        ));
        assert!(validate_frame(2, 3, 0, 0).is_err());
        assert!(validate_frame(usize::MAX, 2, 1, 0).is_err());
    }

    #[test]
    fn negative_regions_are_rejected() {
        assert!(validate_region(&Rect::new(-4, -4, 2, 2)).is_ok());
        assert!(validate_region(&Rect::new(0, 0, -1, 2)).is_err());
    }
}
