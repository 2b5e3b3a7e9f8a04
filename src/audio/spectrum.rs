use std::ops::Range;
use std::sync::Arc;

use clap::ValueEnum;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::Deserialize;

/// Taper applied to each window before the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    #[default]
    Rectangular,
    Hann,
}

/// Turns fixed-length windows into `bins` averaged magnitudes.
pub struct SpectralBinner {
    fft: Arc<dyn Fft<f32>>,
    taper: Option<Vec<f32>>,
    window_len: usize,
    /// Spectrum indices kept after frequency restriction
    band: Range<usize>,
    buckets: Vec<Range<usize>>,
}

impl SpectralBinner {
    /// `x_exponent` of 0 selects linear bucket spacing, anything above a power-law.
    pub fn new(
        window_len: usize,
        sample_rate: u32,
        frequency_range: (f64, f64),
        bins: usize,
        x_exponent: f64,
        window: WindowFunction,
    ) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window_len);

        let spectrum_len = window_len / 2 + 1;
        let band = frequency_band(spectrum_len, sample_rate, frequency_range.0, frequency_range.1);
        let buckets = (0..bins)
            .map(|i| bucket_bounds(i, bins, band.len(), x_exponent))
            .collect();

        let taper = match window {
            WindowFunction::Rectangular => None,
            WindowFunction::Hann => Some(hann_window(window_len)),
        };

        Self {
            fft,
            taper,
            window_len,
            band,
            buckets,
        }
    }

    pub fn bins(&self) -> usize {
        self.buckets.len()
    }

    /// Magnitudes of the non-negative frequencies, restricted to the configured band.
    pub fn spectrum(&self, window: &[f32]) -> Vec<f32> {
        debug_assert_eq!(window.len(), self.window_len);

        let mut buffer: Vec<Complex<f32>> = match &self.taper {
            Some(taper) => window
                .iter()
                .zip(taper)
                .map(|(&s, &w)| Complex::new(s * w, 0.0))
                .collect(),
            None => window.iter().map(|&s| Complex::new(s, 0.0)).collect(),
        };
        self.fft.process(&mut buffer);

        buffer[self.band.clone()].iter().map(|c| c.norm()).collect()
    }

    /// Mean magnitude per bucket.
    pub fn bin(&self, spectrum: &[f32]) -> Vec<f32> {
        self.buckets
            .iter()
            .map(|r| spectrum[r.clone()].iter().sum::<f32>() / r.len() as f32)
            .collect()
    }

    pub fn process(&self, window: &[f32]) -> Vec<f32> {
        self.bin(&self.spectrum(window))
    }
}

/// Spectrum indices covering `[start_hz, end_hz)`, never empty.
pub fn frequency_band(spectrum_len: usize, sample_rate: u32, start_hz: f64, end_hz: f64) -> Range<usize> {
    let nyquist = sample_rate as f64 / 2.0;
    let index = |hz: f64| ((hz / nyquist * spectrum_len as f64).floor().max(0.0) as usize).min(spectrum_len);

    let start = index(start_hz).min(spectrum_len - 1);
    let end = index(end_hz).max(start + 1);
    start..end
}

/// Index range of bucket `i` in a spectrum of `len` values.
///
/// Empty ranges are widened by one index and the result is clamped into the
/// spectrum, so `end > start` always holds.
pub fn bucket_bounds(i: usize, bins: usize, len: usize, x_exponent: f64) -> Range<usize> {
    let position = |k: usize| {
        let fraction = k as f64 / bins as f64;
        let scaled = if x_exponent > 0.0 {
            fraction.powf(x_exponent)
        } else {
            fraction
        };
        (scaled * len as f64) as usize
    };

    debug_assert!(len > 0);
    let start = position(i).min(len - 1);
    let mut end = position(i + 1).min(len);
    if end <= start {
        end = start + 1;
    }
    start..end
}

fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_buckets_tile_the_spectrum() {
        let len = 736;
        let bins = 64;
        let ranges: Vec<_> = (0..bins).map(|i| bucket_bounds(i, bins, len, 0.0)).collect();
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[bins - 1].end, len);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn buckets_are_never_empty() {
        for &len in &[1usize, 2, 3, 7, 64, 736] {
            for &bins in &[1usize, 5, 64, 1080] {
                for &exp in &[0.0, 0.5, 1.0, 2.0, 6.0] {
                    for i in 0..bins {
                        let r = bucket_bounds(i, bins, len, exp);
                        assert!(r.end > r.start, "len={len} bins={bins} exp={exp} i={i}");
                        assert!(r.end <= len);
                    }
                }
            }
        }
    }

    #[test]
    fn power_law_compresses_low_buckets() {
        let narrow = bucket_bounds(0, 16, 1000, 2.0);
        let wide = bucket_bounds(15, 16, 1000, 2.0);
        assert!(narrow.len() < wide.len());
    }

    #[test]
    fn frequency_band_uses_nyquist_fraction() {
        // 736 values spanning 0..22050 Hz
        let band = frequency_band(736, 44100, 0.0, 22050.0);
        assert_eq!(band, 0..736);
        let band = frequency_band(736, 44100, 11025.0, 22050.0);
        assert_eq!(band, 368..736);
        let band = frequency_band(736, 44100, 100.0, 101.0);
        assert_eq!(band.len(), 1);
    }

    #[test]
    fn pure_tone_lands_in_its_bucket() {
        // 3000 Hz completes exactly 100 cycles in 1470 samples at 44100 Hz
        let window: Vec<f32> = (0..1470)
            .map(|n| (2.0 * std::f32::consts::PI * 3000.0 * n as f32 / 44100.0).sin())
            .collect();
        let binner = SpectralBinner::new(1470, 44100, (0.0, 22050.0), 64, 0.0, WindowFunction::Rectangular);
        let bins = binner.process(&window);

        assert_eq!(bins.len(), 64);
        let peak = bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 8);
        let others = bins.iter().enumerate().filter(|(i, _)| *i != 8).map(|(_, v)| *v);
        assert!(others.fold(0.0f32, f32::max) < bins[8] * 1e-3);
    }

    #[test]
    fn buckets_reduce_to_their_mean() {
        // a 6-sample window keeps 4 spectrum values
        let binner = SpectralBinner::new(6, 8000, (0.0, 4000.0), 2, 0.0, WindowFunction::Rectangular);
        assert_eq!(binner.bin(&[1.0, 2.0, 3.0, 4.0]), vec![1.5, 3.5]);

        let binner = SpectralBinner::new(6, 8000, (0.0, 4000.0), 3, 0.0, WindowFunction::Rectangular);
        assert_eq!(binner.bin(&[1.0, 2.0, 3.0, 4.0]), vec![1.0, 2.0, 3.5]);
    }

    #[test]
    fn hann_window_is_symmetric() {
        let w = hann_window(9);
        assert!(w[0].abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[1] - w[7]).abs() < 1e-6);
    }
}
