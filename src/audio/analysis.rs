use rayon::prelude::*;

use super::bins::{BinMatrix, Spectra};
use super::normalize::{compress_log, normalize};
use super::segment::{Segmenter, Segments};
use super::smooth::{smooth_spatial, smooth_temporal};
use super::spectrum::SpectralBinner;
use crate::error::VisualizerResult;
use crate::settings::AnalysisSettings;

/// Build the normalized per-channel bin matrices for already reduced and trimmed channels.
pub fn analyze(
    channels: &[Vec<f32>],
    sample_rate: u32,
    settings: &AnalysisSettings,
) -> VisualizerResult<Spectra> {
    let segmenter = Segmenter::new(sample_rate, settings.framerate, settings.duration_ms)?;
    let binner = SpectralBinner::new(
        segmenter.window_len(),
        sample_rate,
        (settings.frequency_start, settings.frequency_end),
        settings.bins,
        settings.x_log,
        settings.window,
    );

    let mut matrices = Vec::with_capacity(channels.len());
    for (index, samples) in channels.iter().enumerate() {
        let segments = segmenter.segment(samples)?;
        log::info!(
            "Pass 1: Per-frame FFT, channel {} ({} frames, window {} samples)...",
            index,
            segments.len(),
            segmenter.window_len()
        );
        let matrix = bin_channel(&segments, &binner);

        log::info!(
            "Pass 2: Smoothing (temporal={}, spatial={})...",
            settings.smooth_t,
            settings.smooth_y
        );
        let matrix = smooth_temporal(&matrix, settings.smooth_t);
        let matrix = smooth_spatial(&matrix, settings.smooth_y);
        matrices.push(matrix);
    }

    log::info!("Pass 3: Normalization (ylog={})...", settings.y_log);
    normalize(&mut matrices)?;
    compress_log(&mut matrices, settings.y_log);

    Ok(Spectra { channels: matrices })
}

fn bin_channel(segments: &Segments<'_>, binner: &SpectralBinner) -> BinMatrix {
    let rows: Vec<Vec<f32>> = (0..segments.len())
        .into_par_iter()
        .map(|j| binner.process(&segments.window(j)))
        .collect();
    BinMatrix::from_rows(binner.bins(), rows)
}
