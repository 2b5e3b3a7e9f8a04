use clap::ValueEnum;
use serde::Deserialize;

use super::decode::AudioData;
use crate::error::{VisualizerError, VisualizerResult};

/// How the decoded channels are reduced before segmentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    #[default]
    Average,
    Left,
    Right,
    /// Keep left and right as two independent channels
    Stereo,
}

/// Reduce `audio` according to `mode` and trim every kept channel to
/// `[start, end)` seconds.
pub fn prepare_channels(
    audio: &AudioData,
    mode: ChannelMode,
    start: f64,
    end: f64,
) -> VisualizerResult<Vec<Vec<f32>>> {
    if audio.is_empty() {
        return Err(VisualizerError::invalid_range("audio contains no samples"));
    }
    let range = sample_range(audio.len(), audio.sample_rate, start, end)?;

    let trimmed = |channel: &Vec<f32>| channel[range.clone()].to_vec();
    let first = &audio.channels[0];
    let second = audio.channels.get(1);

    let reduced = match mode {
        ChannelMode::Average => {
            let count = audio.channels.len() as f32;
            let mixed = range
                .clone()
                .map(|i| audio.channels.iter().map(|c| c[i]).sum::<f32>() / count)
                .collect();
            vec![mixed]
        }
        ChannelMode::Left => vec![trimmed(first)],
        ChannelMode::Right => match second {
            Some(right) => vec![trimmed(right)],
            None => {
                log::warn!("Right channel requested on mono input, using the only channel");
                vec![trimmed(first)]
            }
        },
        ChannelMode::Stereo => match second {
            Some(right) => vec![trimmed(first), trimmed(right)],
            None => {
                log::warn!("Stereo mode on mono input, duplicating the channel");
                let mono = trimmed(first);
                vec![mono.clone(), mono]
            }
        },
    };

    Ok(reduced)
}

/// Sample indices for `[start, end)` seconds, validated against the signal length.
pub fn sample_range(
    total_samples: usize,
    sample_rate: u32,
    start: f64,
    end: f64,
) -> VisualizerResult<std::ops::Range<usize>> {
    let duration = total_samples as f64 / sample_rate as f64;
    let slack = 1.0 / sample_rate as f64;

    if !start.is_finite() || !end.is_finite() {
        return Err(VisualizerError::invalid_range("start and end must be finite"));
    }
    if start < 0.0 {
        return Err(VisualizerError::invalid_range(format!(
            "start time {start}s is before the beginning of the audio"
        )));
    }
    if start >= end {
        return Err(VisualizerError::invalid_range(format!(
            "start time {start}s must predate end time {end}s"
        )));
    }
    if end > duration + slack {
        return Err(VisualizerError::invalid_range(format!(
            "end time {end}s exceeds audio length of {duration:.3}s"
        )));
    }

    let first = ((start * sample_rate as f64) as usize).min(total_samples);
    let last = ((end * sample_rate as f64) as usize).min(total_samples);
    if first >= last {
        return Err(VisualizerError::invalid_range(format!(
            "time range {start}s..{end}s selects no samples"
        )));
    }
    Ok(first..last)
}
