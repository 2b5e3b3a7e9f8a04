mod audio;
mod cli;
mod config;
mod encode;
mod error;
mod render;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use encode::assemble::{Assembler, AudioTrack};
use encode::ffmpeg::{is_ffmpeg_on_path, EncoderSettings, VideoSegments};
use encode::image_seq::ImageSequence;
use error::VisualizerError;
use render::chunk::ChunkPlan;
use render::frame::FrameRenderer;
use render::pipeline::{render_chunks, Progress};
use settings::{OutputMode, Settings};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let file_config = match config::find_config(cli.config.as_deref()) {
        Some(path) => {
            let cfg = config::load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => config::Config::default(),
    };

    let input = &cli.input;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("spectrovid - audio spectrum renderer");
    log::info!("Input: {}", input.display());

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio_data = audio::decode::decode_audio(input)?;

    // 2. Resolve settings against the decoded audio
    let settings = Settings::resolve(&cli, &file_config, audio_data.sample_rate, audio_data.len())?;
    let output = &settings.output;
    if output.mode.is_video() && !output.preview && !is_ffmpeg_on_path() {
        return Err(VisualizerError::configuration(
            "ffmpeg is required for video output, but was not found on PATH",
        )
        .into());
    }
    log::info!("Output: {} ({:?})", output.destination.display(), output.mode);
    log::info!(
        "Resolution: {}x{} @ {}fps, {} bins",
        settings.style.width,
        settings.style.height,
        settings.analysis.framerate,
        settings.analysis.bins
    );

    // 3. Analyze audio
    log::info!("Analyzing audio...");
    let analysis = &settings.analysis;
    let channels =
        audio::channel::prepare_channels(&audio_data, analysis.channel, analysis.start, analysis.end)?;
    let sample_rate = audio_data.sample_rate;
    drop(audio_data);
    let spectra = audio::analysis::analyze(&channels, sample_rate, analysis)?;
    drop(channels);

    let total_frames = spectra.frames();
    log::info!(
        "Total frames: {}, Duration: {:.1}s, {}",
        total_frames,
        analysis.end - analysis.start,
        if spectra.is_stereo() { "stereo" } else { "mono" }
    );

    let renderer = FrameRenderer::new(settings.style.clone());

    // 4. Preview: a single frame from the middle of the range
    if output.preview {
        let path = output.preview_path();
        let frame = renderer.render(spectra.frame(total_frames / 2));
        frame
            .save(&path)
            .with_context(|| format!("Failed to write preview {}", path.display()))?;
        log::info!("Done! Preview: {}", path.display());
        return Ok(());
    }

    // 5. Render and write in parallel
    let plan = ChunkPlan::new(total_frames, settings.schedule.chunk_size, settings.schedule.workers)?;
    let progress = Progress::new(total_frames);

    match output.mode {
        OutputMode::Images => {
            let sequence = ImageSequence::create(&output.destination)?;
            render_chunks(&plan, &renderer, &spectra, &sequence, &progress)?;
        }
        OutputMode::Video | OutputMode::VideoAudio => {
            let encoder = EncoderSettings {
                program: "ffmpeg".into(),
                width: settings.style.width,
                height: settings.style.height,
                framerate: analysis.framerate,
                codec: output.codec.clone(),
                pix_fmt: output.pix_fmt.clone(),
                crf: output.crf,
                bitrate: output.bitrate.clone(),
            };
            let segments = VideoSegments::create(output.parts_dir(), encoder)?;
            render_chunks(&plan, &renderer, &spectra, &segments, &progress)?;

            // 6. Concatenate segments in worker order
            let audio = (output.mode == OutputMode::VideoAudio).then(|| AudioTrack {
                path: input.clone(),
                start: analysis.start,
                duration: analysis.end - analysis.start,
            });
            let assembler = Assembler {
                program: "ffmpeg".into(),
                parts_dir: output.parts_dir(),
                destination: output.destination.clone(),
                audio,
            };
            assembler.run(plan.workers.len())?;
            if output.keep_parts {
                log::info!("Keeping segments in {}", assembler.parts_dir.display());
            } else {
                assembler.remove_parts()?;
            }
        }
    }

    log::info!("Done! Output: {}", output.destination.display());
    Ok(())
}
