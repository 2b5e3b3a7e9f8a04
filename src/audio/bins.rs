/// Row-major `frames x bins` matrix of aggregated magnitudes for one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct BinMatrix {
    bins: usize,
    data: Vec<f32>,
}

impl BinMatrix {
    pub fn from_rows(bins: usize, rows: Vec<Vec<f32>>) -> Self {
        let mut data = Vec::with_capacity(rows.len() * bins);
        for row in rows {
            assert_eq!(row.len(), bins, "bin vector length must match bin count");
            data.extend(row);
        }
        Self { bins, data }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn frames(&self) -> usize {
        if self.bins == 0 {
            0
        } else {
            self.data.len() / self.bins
        }
    }

    pub fn row(&self, frame: usize) -> &[f32] {
        &self.data[frame * self.bins..(frame + 1) * self.bins]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.bins)
    }

    #[allow(dead_code)]
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }
}

/// Per-channel bin matrices of one run: one for mono, two for stereo.
#[derive(Clone, Debug)]
pub struct Spectra {
    pub channels: Vec<BinMatrix>,
}

impl Spectra {
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, BinMatrix::frames)
    }

    pub fn is_stereo(&self) -> bool {
        self.channels.len() == 2
    }

    /// Bin vectors for frame `j`, right channel present only in stereo.
    pub fn frame(&self, j: usize) -> FrameBins<'_> {
        FrameBins {
            left: self.channels[0].row(j),
            right: self.channels.get(1).map(|m| m.row(j)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FrameBins<'a> {
    pub left: &'a [f32],
    pub right: Option<&'a [f32]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_keep_frame_order() {
        let m = BinMatrix::from_rows(2, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        assert_eq!(m.frames(), 3);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert_eq!(m.rows().count(), 3);
        assert_eq!(m.max(), 6.0);
    }

    #[test]
    fn stereo_frames_expose_both_sides() {
        let left = BinMatrix::from_rows(1, vec![vec![1.0]]);
        let right = BinMatrix::from_rows(1, vec![vec![2.0]]);
        let spectra = Spectra {
            channels: vec![left, right],
        };
        let frame = spectra.frame(0);
        assert!(spectra.is_stereo());
        assert_eq!(frame.left, &[1.0]);
        assert_eq!(frame.right, Some(&[2.0][..]));
    }
}
