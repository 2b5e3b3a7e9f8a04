use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use image::Rgb;
use serde::Deserialize;

use crate::audio::channel::ChannelMode;
use crate::audio::smooth::{auto_spatial_radius, auto_temporal_radius};
use crate::audio::spectrum::WindowFunction;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{VisualizerError, VisualizerResult};
use crate::render::style::{HexColor, Mirror, Style, StyleKind, StyleParams};

const DEFAULT_BINS: usize = 64;
const DEFAULT_WIDTH: u32 = 1920;
const DEFAULT_HEIGHT: u32 = 540;
const DEFAULT_FRAMERATE: f64 = 30.0;
const DEFAULT_DESTINATION: &str = "spectrum";
const DEFAULT_LINE_THICKNESS: f64 = 2.0;
const DEFAULT_INNER_RADIUS: f64 = 0.3;
/// Frames in flight across all workers when no chunk size is given.
const FRAMES_IN_FLIGHT: usize = 128;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Directory of numbered PNG frames
    #[default]
    Images,
    /// MP4 without sound
    Video,
    /// MP4 with the rendered range of the input audio
    VideoAudio,
}

impl OutputMode {
    pub fn is_video(self) -> bool {
        matches!(self, OutputMode::Video | OutputMode::VideoAudio)
    }
}

/// Smoothing radius given as a number or `auto`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmoothRadius {
    Auto,
    Radius(usize),
}

impl FromStr for SmoothRadius {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(SmoothRadius::Auto);
        }
        s.parse()
            .map(SmoothRadius::Radius)
            .map_err(|_| format!("smoothing radius must be a non-negative integer or 'auto', got '{s}'"))
    }
}

impl<'de> Deserialize<'de> for SmoothRadius {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(usize),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(SmoothRadius::Radius(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Bin width or spacing in pixels, or `auto`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum BinDimension {
    #[default]
    Auto,
    Pixels(f64),
}

impl FromStr for BinDimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(BinDimension::Auto);
        }
        s.parse()
            .map(BinDimension::Pixels)
            .map_err(|_| format!("expected a pixel size or 'auto', got '{s}'"))
    }
}

impl<'de> Deserialize<'de> for BinDimension {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(px) => Ok(BinDimension::Pixels(px)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Everything the analysis stage needs, resolved against the decoded audio.
#[derive(Clone, Debug)]
pub struct AnalysisSettings {
    pub bins: usize,
    pub framerate: f64,
    pub duration_ms: f64,
    pub x_log: f64,
    pub y_log: f64,
    pub smooth_t: usize,
    pub smooth_y: usize,
    pub frequency_start: f64,
    pub frequency_end: f64,
    pub channel: ChannelMode,
    pub window: WindowFunction,
    /// Rendered range in seconds
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug)]
pub struct OutputSettings {
    pub destination: PathBuf,
    pub mode: OutputMode,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    pub bitrate: Option<String>,
    pub keep_parts: bool,
    pub preview: bool,
}

impl OutputSettings {
    pub fn parts_dir(&self) -> PathBuf {
        self.destination.with_extension("parts")
    }

    pub fn preview_path(&self) -> PathBuf {
        self.destination.with_extension("png")
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Schedule {
    pub chunk_size: usize,
    pub workers: usize,
}

/// Immutable configuration of one run.
#[derive(Clone, Debug)]
pub struct Settings {
    pub analysis: AnalysisSettings,
    pub style: StyleParams,
    pub output: OutputSettings,
    pub schedule: Schedule,
}

/// Pick the first value present: command line, then config file.
fn pick<T: Clone>(cli: &Option<T>, file: &Option<T>) -> Option<T> {
    cli.clone().or_else(|| file.clone())
}

fn config_error(msg: impl Into<String>) -> VisualizerError {
    VisualizerError::configuration(msg)
}

impl Settings {
    /// Merge command line over config file over defaults and validate the
    /// result against the decoded audio.
    pub fn resolve(cli: &Cli, file: &Config, sample_rate: u32, total_samples: usize) -> VisualizerResult<Self> {
        let (fo, fa, fs, fr) = (&file.output, &file.analysis, &file.style, &file.render);
        let audio_seconds = total_samples as f64 / sample_rate as f64;
        let nyquist = sample_rate as f64 / 2.0;

        let bins = pick(&cli.bins, &fa.bins).unwrap_or(DEFAULT_BINS);
        if bins == 0 {
            return Err(config_error("there must be at least one bin"));
        }
        let mut width = pick(&cli.width, &fo.width).unwrap_or(DEFAULT_WIDTH);
        let height = pick(&cli.height, &fo.height).unwrap_or(DEFAULT_HEIGHT);
        if width == 0 {
            return Err(config_error("width must be at least 1px"));
        }
        if height == 0 {
            return Err(config_error("height must be at least 1px"));
        }

        let framerate = pick(&cli.framerate, &fo.framerate).unwrap_or(DEFAULT_FRAMERATE);
        if !(framerate.is_finite() && framerate > 0.0) {
            return Err(config_error(format!("framerate must be above 0, got {framerate}")));
        }

        let x_log = pick(&cli.xlog, &fa.xlog).unwrap_or(0.0);
        let y_log = pick(&cli.ylog, &fa.ylog).unwrap_or(0.0);
        if !(x_log.is_finite() && x_log >= 0.0) {
            return Err(config_error("xlog must not be smaller than 0"));
        }
        if !(y_log.is_finite() && y_log >= 0.0) {
            return Err(config_error("ylog must not be smaller than 0"));
        }

        let pitch = width as f64 / bins as f64;
        let (bin_width, bin_spacing) = match (
            pick(&cli.bin_width, &fs.bin_width).unwrap_or_default(),
            pick(&cli.bin_spacing, &fs.bin_spacing).unwrap_or_default(),
        ) {
            (BinDimension::Auto, BinDimension::Auto) => (pitch * 5.0 / 6.0, pitch / 6.0),
            (BinDimension::Pixels(w), BinDimension::Auto) => (w, pitch - w),
            (BinDimension::Auto, BinDimension::Pixels(s)) => (pitch - s, s),
            (BinDimension::Pixels(w), BinDimension::Pixels(s)) => {
                width = (bins as f64 * (w + s)).floor() as u32;
                log::info!("Bin width and spacing both given, width set to {}px", width);
                (w, s)
            }
        };
        if !(bin_width >= 1.0) {
            return Err(config_error(format!("bin width must be at least 1px, got {bin_width:.2}px")));
        }
        if !(bin_spacing >= 0.0) {
            return Err(config_error(format!("bin spacing must be 0px or more, got {bin_spacing:.2}px")));
        }

        let duration_ms = pick(&cli.duration, &fa.duration).unwrap_or(1000.0 / framerate);
        if !(duration_ms.is_finite() && duration_ms > 0.0) {
            return Err(config_error("per-frame duration must be longer than 0ms"));
        }
        if duration_ms / 1000.0 > audio_seconds {
            return Err(config_error(format!(
                "per-frame duration must not exceed the audio length of {audio_seconds:.3}s"
            )));
        }

        let start = cli.start.unwrap_or(0.0);
        let end = cli.end.unwrap_or(audio_seconds);
        crate::audio::channel::sample_range(total_samples, sample_rate, start, end)?;

        let frequency_start = pick(&cli.frequency_start, &fa.frequency_start).unwrap_or(0.0);
        let frequency_end = pick(&cli.frequency_end, &fa.frequency_end).unwrap_or(nyquist);
        if frequency_start < 0.0 {
            return Err(config_error("frequency start must be 0Hz or higher"));
        }
        if frequency_end > nyquist {
            return Err(config_error(format!("frequency end exceeds the maximum of {nyquist}Hz")));
        }
        if !(frequency_start < frequency_end) {
            return Err(config_error("frequency start must be lower than frequency end"));
        }

        let (smooth_t, smooth_y) = if cli.disable_smoothing {
            (0, 0)
        } else {
            let t = match pick(&cli.smooth_t, &fa.smooth_t).unwrap_or(SmoothRadius::Radius(0)) {
                SmoothRadius::Auto => auto_temporal_radius(framerate),
                SmoothRadius::Radius(r) => r,
            };
            let y = match pick(&cli.smooth_y, &fa.smooth_y).unwrap_or(SmoothRadius::Radius(0)) {
                SmoothRadius::Auto => auto_spatial_radius(bins),
                SmoothRadius::Radius(r) => r,
            };
            (t, y)
        };

        let channel = pick(&cli.channel, &fa.channel).unwrap_or_default();
        let window = pick(&cli.window, &fa.window).unwrap_or_default();

        let workers = match pick(&cli.workers, &fr.workers) {
            Some(0) => return Err(config_error("there must be at least one worker")),
            Some(n) => n,
            None => std::thread::available_parallelism().map_or(1, |n| n.get()),
        };
        let chunk_size = match pick(&cli.chunk_size, &fr.chunk_size) {
            Some(0) => return Err(config_error("chunk size must be at least 1")),
            Some(n) => n,
            None => (FRAMES_IN_FLIGHT / workers).max(1),
        };

        let mirror = Mirror::try_from(pick(&cli.mirror, &fs.mirror).unwrap_or(0)).map_err(config_error)?;
        let style = match pick(&cli.style, &fs.kind).unwrap_or_default() {
            StyleKind::Bars => Style::Bars,
            StyleKind::Fill => Style::Fill,
            StyleKind::Points => {
                let point_width = pick(&cli.point_width, &fs.point_width).unwrap_or(bin_width);
                if !(point_width >= 1.0) {
                    return Err(config_error("point width must be at least 1px"));
                }
                if point_width > bin_width {
                    return Err(config_error(format!(
                        "point width must not exceed the bin width of {bin_width:.2}px"
                    )));
                }
                Style::Points {
                    shape: pick(&cli.point_shape, &fs.point_shape).unwrap_or_default(),
                    width: point_width,
                }
            }
            StyleKind::Line => {
                let thickness = pick(&cli.line_thickness, &fs.line_thickness).unwrap_or(DEFAULT_LINE_THICKNESS);
                if !(thickness >= 1.0) {
                    return Err(config_error("line thickness must be at least 1px"));
                }
                Style::Line { thickness }
            }
            StyleKind::Radial => {
                let inner_radius = pick(&cli.inner_radius, &fs.inner_radius).unwrap_or(DEFAULT_INNER_RADIUS);
                if !(0.0..1.0).contains(&inner_radius) {
                    return Err(config_error("inner radius must be in [0, 1)"));
                }
                if channel == ChannelMode::Stereo {
                    return Err(config_error("the radial style renders a single channel"));
                }
                if mirror != Mirror::Off {
                    return Err(config_error("the radial style cannot be mirrored"));
                }
                Style::Radial { inner_radius }
            }
        };

        let mode = pick(&cli.mode, &fo.mode).unwrap_or_default();
        let preview = cli.test;
        let mut destination = cli
            .destination
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION));
        if mode.is_video() {
            if destination.extension().is_none() {
                destination.set_extension("mp4");
            }
            if !preview && (width % 2 != 0 || height % 2 != 0) {
                return Err(config_error(format!(
                    "video output needs an even width and height, got {width}x{height}"
                )));
            }
        }

        let color = pick(&cli.color, &fs.color).map_or(Rgb([255, 255, 255]), |HexColor(c)| c);
        let background = pick(&cli.background, &fs.background).map_or(Rgb([0, 0, 0]), |HexColor(c)| c);

        Ok(Settings {
            analysis: AnalysisSettings {
                bins,
                framerate,
                duration_ms,
                x_log,
                y_log,
                smooth_t,
                smooth_y,
                frequency_start,
                frequency_end,
                channel,
                window,
                start,
                end,
            },
            style: StyleParams {
                width,
                height,
                bin_width,
                bin_spacing,
                style,
                color,
                background,
                mirror,
            },
            output: OutputSettings {
                destination,
                mode,
                codec: pick(&cli.codec, &fo.codec).unwrap_or_else(|| "libx264".into()),
                pix_fmt: pick(&cli.pix_fmt, &fo.pix_fmt).unwrap_or_else(|| "yuv420p".into()),
                crf: pick(&cli.crf, &fo.crf).unwrap_or(18),
                bitrate: pick(&cli.bitrate, &fo.bitrate),
                keep_parts: cli.keep_parts || fo.keep_parts.unwrap_or(false),
                preview,
            },
            schedule: Schedule { chunk_size, workers },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    const SR: u32 = 44100;
    const TEN_SECONDS: usize = 441_000;

    fn cli() -> Cli {
        Cli {
            input: PathBuf::from("song.wav"),
            ..Cli::default()
        }
    }

    fn resolve(cli: &Cli) -> VisualizerResult<Settings> {
        Settings::resolve(cli, &Config::default(), SR, TEN_SECONDS)
    }

    fn is_config_error(r: VisualizerResult<Settings>) -> bool {
        matches!(r, Err(VisualizerError::Configuration(_)))
    }

    #[test]
    fn defaults() {
        let s = resolve(&cli()).unwrap();
        assert_eq!(s.analysis.bins, 64);
        assert_eq!((s.style.width, s.style.height), (1920, 540));
        assert_eq!(s.analysis.framerate, 30.0);
        assert!((s.analysis.duration_ms - 1000.0 / 30.0).abs() < 1e-9);
        assert_eq!(s.analysis.frequency_end, 22050.0);
        assert_eq!((s.analysis.start, s.analysis.end), (0.0, 10.0));
        assert!((s.style.bin_width - 25.0).abs() < 1e-9);
        assert!((s.style.bin_spacing - 5.0).abs() < 1e-9);
        assert_eq!(s.style.style, Style::Bars);
        assert_eq!(s.output.mode, OutputMode::Images);
        assert!(s.schedule.workers >= 1);
        assert_eq!(s.schedule.chunk_size, (128 / s.schedule.workers).max(1));
    }

    #[test]
    fn explicit_bin_width_and_spacing_override_width() {
        let mut c = cli();
        c.bins = Some(10);
        c.bin_width = Some(BinDimension::Pixels(12.0));
        c.bin_spacing = Some(BinDimension::Pixels(3.5));
        let s = resolve(&c).unwrap();
        assert_eq!(s.style.width, 155);
    }

    #[test]
    fn one_explicit_dimension_derives_the_other() {
        let mut c = cli();
        c.bins = Some(64);
        c.bin_spacing = Some(BinDimension::Pixels(10.0));
        let s = resolve(&c).unwrap();
        assert!((s.style.bin_width - 20.0).abs() < 1e-9);
        assert_eq!(s.style.width, 1920);
    }

    #[test]
    fn cli_beats_config_file_beats_default() {
        let file = parse_config("[analysis]\nbins = 32\n[output]\nheight = 200\n").unwrap();
        let mut c = cli();
        c.bins = Some(16);
        let s = Settings::resolve(&c, &file, SR, TEN_SECONDS).unwrap();
        assert_eq!(s.analysis.bins, 16);
        assert_eq!(s.style.height, 200);
        assert_eq!(s.style.width, 1920);
    }

    #[test]
    fn auto_and_disabled_smoothing() {
        let mut c = cli();
        c.framerate = Some(60.0);
        c.smooth_t = Some(SmoothRadius::Auto);
        c.smooth_y = Some(SmoothRadius::Auto);
        let s = resolve(&c).unwrap();
        assert_eq!((s.analysis.smooth_t, s.analysis.smooth_y), (4, 2));

        c.disable_smoothing = true;
        let s = resolve(&c).unwrap();
        assert_eq!((s.analysis.smooth_t, s.analysis.smooth_y), (0, 0));
    }

    #[test]
    fn rejects_invalid_dimensions_and_rates() {
        let cases: Vec<fn(&mut Cli)> = vec![
            |c| c.bins = Some(0),
            |c| c.width = Some(0),
            |c| c.height = Some(0),
            |c| c.framerate = Some(0.0),
            |c| c.xlog = Some(-1.0),
            |c| c.ylog = Some(-0.5),
            |c| c.bin_width = Some(BinDimension::Pixels(0.5)),
            |c| c.bin_spacing = Some(BinDimension::Pixels(-1.0)),
            |c| c.duration = Some(0.0),
            |c| c.duration = Some(11_000.0),
            |c| c.frequency_end = Some(30_000.0),
            |c| {
                c.frequency_start = Some(5_000.0);
                c.frequency_end = Some(4_000.0);
            },
            |c| c.chunk_size = Some(0),
            |c| c.workers = Some(0),
        ];
        for (i, tweak) in cases.into_iter().enumerate() {
            let mut c = cli();
            tweak(&mut c);
            assert!(is_config_error(resolve(&c)), "case {i}");
        }
    }

    #[test]
    fn time_range_errors_are_range_errors() {
        let mut c = cli();
        c.start = Some(5.0);
        c.end = Some(4.0);
        assert!(matches!(resolve(&c), Err(VisualizerError::InvalidRange(_))));

        let mut c = cli();
        c.end = Some(12.0);
        assert!(matches!(resolve(&c), Err(VisualizerError::InvalidRange(_))));
    }

    #[test]
    fn point_width_defaults_to_and_is_capped_by_bin_width() {
        let mut c = cli();
        c.style = Some(StyleKind::Points);
        let s = resolve(&c).unwrap();
        assert!(matches!(s.style.style, Style::Points { width, .. } if (width - 25.0).abs() < 1e-9));

        c.point_width = Some(26.0);
        assert!(is_config_error(resolve(&c)));
        c.point_width = Some(0.5);
        assert!(is_config_error(resolve(&c)));
    }

    #[test]
    fn radial_is_mono_without_mirror() {
        let mut c = cli();
        c.style = Some(StyleKind::Radial);
        assert!(matches!(resolve(&c).unwrap().style.style, Style::Radial { inner_radius } if inner_radius == 0.3));

        c.mirror = Some(1);
        assert!(is_config_error(resolve(&c)));

        c.mirror = None;
        c.channel = Some(ChannelMode::Stereo);
        assert!(is_config_error(resolve(&c)));

        c.channel = None;
        c.inner_radius = Some(1.0);
        assert!(is_config_error(resolve(&c)));
    }

    #[test]
    fn video_needs_even_dimensions() {
        let mut c = cli();
        c.mode = Some(OutputMode::Video);
        c.height = Some(541);
        assert!(is_config_error(resolve(&c)));

        c.height = Some(540);
        let s = resolve(&c).unwrap();
        assert_eq!(s.output.destination, PathBuf::from("spectrum.mp4"));
        assert_eq!(s.output.parts_dir(), PathBuf::from("spectrum.parts"));
    }

    #[test]
    fn parses_radius_and_dimension_strings() {
        assert_eq!("auto".parse::<SmoothRadius>().unwrap(), SmoothRadius::Auto);
        assert_eq!("3".parse::<SmoothRadius>().unwrap(), SmoothRadius::Radius(3));
        assert!("-1".parse::<SmoothRadius>().is_err());
        assert_eq!("AUTO".parse::<BinDimension>().unwrap(), BinDimension::Auto);
        assert_eq!("7.5".parse::<BinDimension>().unwrap(), BinDimension::Pixels(7.5));
        assert!("wide".parse::<BinDimension>().is_err());
    }
}
