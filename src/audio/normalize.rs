use super::bins::BinMatrix;
use crate::error::{VisualizerError, VisualizerResult};

/// Scale every channel by the maximum over all channels, mapping values into `[0, 1]`.
pub fn normalize(channels: &mut [BinMatrix]) -> VisualizerResult<()> {
    let max = channels.iter().map(BinMatrix::max).fold(0.0f32, f32::max);
    if !(max.is_finite() && max > 0.0) {
        return Err(VisualizerError::degenerate(
            "selected audio is silent, nothing to render",
        ));
    }

    for matrix in channels.iter_mut() {
        for value in matrix.values_mut() {
            *value /= max;
        }
    }
    Ok(())
}

/// Logarithmic vertical compression of normalized values; `base == 0` leaves them as-is.
pub fn compress_log(channels: &mut [BinMatrix], base: f64) {
    if base <= 0.0 {
        return;
    }
    let denom = (base + 1.0).log2();
    for matrix in channels.iter_mut() {
        for value in matrix.values_mut() {
            *value = ((base * *value as f64 + 1.0).log2() / denom) as f32;
        }
    }
}
