use crate::error::{VisualizerError, VisualizerResult};

/// Slices a channel into one fixed-length analysis window per output frame.
#[derive(Clone, Copy, Debug)]
pub struct Segmenter {
    step: f64,
    window_len: usize,
}

impl Segmenter {
    /// `duration_ms` is the length of audio analysed per frame.
    pub fn new(sample_rate: u32, framerate: f64, duration_ms: f64) -> VisualizerResult<Self> {
        if sample_rate == 0 {
            return Err(VisualizerError::configuration("sample rate must be non-zero"));
        }
        if !(framerate.is_finite() && framerate > 0.0) {
            return Err(VisualizerError::configuration("framerate must be positive"));
        }
        if !(duration_ms.is_finite() && duration_ms > 0.0) {
            return Err(VisualizerError::configuration("frame duration must be positive"));
        }

        let window_len = (duration_ms / 1000.0 * sample_rate as f64).round() as usize;
        if window_len == 0 {
            return Err(VisualizerError::configuration(format!(
                "frame duration of {duration_ms}ms is shorter than one sample"
            )));
        }

        Ok(Self {
            step: sample_rate as f64 / framerate,
            window_len,
        })
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn frame_count(&self, total_samples: usize) -> usize {
        (total_samples as f64 / self.step).ceil() as usize
    }

    /// First sample of frame `j`'s window, negative when it starts before the signal.
    pub fn window_start(&self, j: usize) -> i64 {
        let midpoint = self.step * j as f64 + self.step / 2.0;
        (midpoint - self.window_len as f64 / 2.0).floor() as i64
    }

    /// Window for frame `j`, zero-padded wherever it extends past either end.
    pub fn window(&self, samples: &[f32], j: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; self.window_len];
        let start = self.window_start(j);
        let end = start + self.window_len as i64;

        let src_start = start.clamp(0, samples.len() as i64) as usize;
        let src_end = end.clamp(0, samples.len() as i64) as usize;
        if src_start < src_end {
            let offset = (src_start as i64 - start) as usize;
            out[offset..offset + (src_end - src_start)].copy_from_slice(&samples[src_start..src_end]);
        }
        out
    }

    /// Windows of a channel, one per frame. Refuses an empty channel.
    pub fn segment<'a>(&self, samples: &'a [f32]) -> VisualizerResult<Segments<'a>> {
        if samples.is_empty() {
            return Err(VisualizerError::invalid_range("cannot segment an empty channel"));
        }
        Ok(Segments {
            segmenter: *self,
            samples,
            frames: self.frame_count(samples.len()),
        })
    }
}

/// A segmented channel. Windows are cut on demand so frames can be
/// processed in any order.
#[derive(Clone, Copy, Debug)]
pub struct Segments<'a> {
    segmenter: Segmenter,
    samples: &'a [f32],
    frames: usize,
}

impl Segments<'_> {
    pub fn len(&self) -> usize {
        self.frames
    }

    pub fn window(&self, j: usize) -> Vec<f32> {
        self.segmenter.window(self.samples, j)
    }

    #[cfg(test)]
    pub fn to_vec(&self) -> Vec<Vec<f32>> {
        (0..self.frames).map(|j| self.window(j)).collect()
    }
}
