use clap::Parser;
use std::path::PathBuf;

use crate::audio::channel::ChannelMode;
use crate::audio::spectrum::WindowFunction;
use crate::render::style::{HexColor, PointShape, StyleKind};
use crate::settings::{BinDimension, OutputMode, SmoothRadius};

/// Every tunable is optional here so the config file can fill the gaps.
#[derive(Parser, Debug, Default)]
#[command(name = "spectrovid", about = "Renders the frequency spectrum of an audio file as frames or video")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: PathBuf,

    /// Output directory (images) or video file. Default: "spectrum"
    pub destination: Option<PathBuf>,

    /// Config file (default: ./spectrovid.toml, then the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// What to produce
    #[arg(short, long, value_enum)]
    pub mode: Option<OutputMode>,

    /// Render only the middle frame to <destination>.png
    #[arg(short, long)]
    pub test: bool,

    /// Number of bins (bars, points, ...). Default: 64
    #[arg(short, long)]
    pub bins: Option<usize>,

    /// Frame width in pixels, replaced by bins * (bin width + spacing) when both are given. Default: 1920
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Frame height in pixels. Default: 540
    #[arg(long)]
    pub height: Option<u32>,

    /// Bin width in pixels or "auto" (5/6 of width / bins)
    #[arg(long)]
    pub bin_width: Option<BinDimension>,

    /// Spacing between bins in pixels or "auto" (1/6 of width / bins)
    #[arg(long)]
    pub bin_spacing: Option<BinDimension>,

    /// Frames per second. Default: 30
    #[arg(short, long)]
    pub framerate: Option<f64>,

    /// Audio analysed per frame in milliseconds. Default: one frame period
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Power-law exponent of the frequency axis, 0 for linear
    #[arg(long)]
    pub xlog: Option<f64>,

    /// Logarithmic amplitude compression base, 0 for linear
    #[arg(long)]
    pub ylog: Option<f64>,

    /// Temporal smoothing radius in frames, or "auto" (framerate / 15). Default: 0
    #[arg(long)]
    pub smooth_t: Option<SmoothRadius>,

    /// Smoothing radius across neighbouring bins, or "auto" (bins / 32). Default: 0
    #[arg(long)]
    pub smooth_y: Option<SmoothRadius>,

    /// Force both smoothing radii to 0
    #[arg(long)]
    pub disable_smoothing: bool,

    /// Start of the rendered range in seconds
    #[arg(short, long)]
    pub start: Option<f64>,

    /// End of the rendered range in seconds. Default: end of the audio
    #[arg(short, long)]
    pub end: Option<f64>,

    /// Lowest analysed frequency in Hz
    #[arg(long)]
    pub frequency_start: Option<f64>,

    /// Highest analysed frequency in Hz. Default: half the sample rate
    #[arg(long)]
    pub frequency_end: Option<f64>,

    /// Channel reduction
    #[arg(long, value_enum)]
    pub channel: Option<ChannelMode>,

    /// Analysis window
    #[arg(long, value_enum)]
    pub window: Option<WindowFunction>,

    /// Frames rendered before they are written. Default: 128 / workers
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Worker threads. Default: logical core count
    #[arg(short = 'p', long)]
    pub workers: Option<usize>,

    /// Render style
    #[arg(long, value_enum)]
    pub style: Option<StyleKind>,

    /// Point shape for the points style
    #[arg(long, value_enum)]
    pub point_shape: Option<PointShape>,

    /// Point width in pixels. Default: bin width
    #[arg(long)]
    pub point_width: Option<f64>,

    /// Line thickness in pixels for the line style
    #[arg(long)]
    pub line_thickness: Option<f64>,

    /// Inner radius of the radial style as a fraction of the outer radius
    #[arg(long)]
    pub inner_radius: Option<f64>,

    /// Bin color, hex or CSS name (e.g. ff0000 or red). Default: ffffff
    #[arg(short, long)]
    pub color: Option<HexColor>,

    /// Background color, hex or CSS name. Default: 000000
    #[arg(long)]
    pub background: Option<HexColor>,

    /// 0 = off, 1 = mirror around the center line, 2 = grow from the edges
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub mirror: Option<u8>,

    /// FFmpeg video codec
    #[arg(long)]
    pub codec: Option<String>,

    /// FFmpeg pixel format
    #[arg(long)]
    pub pix_fmt: Option<String>,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long)]
    pub crf: Option<u32>,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(long)]
    pub bitrate: Option<String>,

    /// Keep the per-worker video segments after assembly
    #[arg(long)]
    pub keep_parts: bool,
}
