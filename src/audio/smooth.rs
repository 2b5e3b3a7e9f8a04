use super::bins::BinMatrix;

/// Moving average of each bin over the surrounding `radius` frames.
///
/// Edge frames average over the truncated window. `radius == 0` is the identity.
pub fn smooth_temporal(matrix: &BinMatrix, radius: usize) -> BinMatrix {
    if radius == 0 {
        return matrix.clone();
    }

    let frames = matrix.frames();
    let bins = matrix.bins();
    let mut out = matrix.clone();

    for i in 0..frames {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius + 1).min(frames);
        let count = (hi - lo) as f32;
        let row = &mut out.values_mut()[i * bins..(i + 1) * bins];
        for (k, value) in row.iter_mut().enumerate() {
            *value = (lo..hi).map(|f| matrix.row(f)[k]).sum::<f32>() / count;
        }
    }
    out
}

/// Moving average of each bin with its `radius` neighbours in the same frame.
pub fn smooth_spatial(matrix: &BinMatrix, radius: usize) -> BinMatrix {
    if radius == 0 {
        return matrix.clone();
    }

    let bins = matrix.bins();
    let mut out = matrix.clone();

    for (src, dst) in matrix
        .rows()
        .zip(out.values_mut().chunks_exact_mut(bins))
    {
        for (k, value) in dst.iter_mut().enumerate() {
            let lo = k.saturating_sub(radius);
            let hi = (k + radius + 1).min(bins);
            *value = src[lo..hi].iter().sum::<f32>() / (hi - lo) as f32;
        }
    }
    out
}

/// Radii derived from the frame rate and bin count when smoothing is set to auto.
pub fn auto_temporal_radius(framerate: f64) -> usize {
    (framerate / 15.0).floor() as usize
}

pub fn auto_spatial_radius(bins: usize) -> usize {
    bins / 32
}
