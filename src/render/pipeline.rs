use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use super::chunk::{ChunkPlan, WorkerPlan};
use super::frame::{Frame, FrameRenderer};
use crate::audio::bins::Spectra;
use crate::encode::sink::SinkFactory;
use crate::error::{VisualizerError, VisualizerResult};

/// Frames written so far, shared by all workers. Observation only.
pub struct Progress {
    done: AtomicUsize,
    bar: ProgressBar,
}

impl Progress {
    pub fn new(total_frames: usize) -> Self {
        let bar = ProgressBar::new(total_frames as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self {
            done: AtomicUsize::new(0),
            bar,
        }
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            done: AtomicUsize::new(0),
            bar: ProgressBar::hidden(),
        }
    }

    fn advance(&self, frames: usize) {
        let done = self.done.fetch_add(frames, Ordering::Relaxed) + frames;
        self.bar.set_position(done as u64);
    }

    pub fn completed(&self) -> usize {
        self.done.load(Ordering::Relaxed)
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Rendering complete");
    }
}

fn build_thread_pool(threads: usize) -> VisualizerResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(VisualizerError::configuration("worker count must be at least 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("render-worker-{i}"))
        .build()
        .map_err(|e| VisualizerError::configuration(format!("failed to build worker pool: {e}")))
}

/// Render and write every frame of `plan`, one worker per block, and wait
/// for all of them. The first failing worker (lowest index) is reported.
pub fn render_chunks(
    plan: &ChunkPlan,
    renderer: &FrameRenderer,
    spectra: &Spectra,
    sinks: &dyn SinkFactory,
    progress: &Progress,
) -> VisualizerResult<()> {
    log::info!(
        "Planning: {} frames in {} chunks of up to {} across {} workers",
        plan.total_frames,
        plan.num_chunks(),
        plan.chunk_size,
        plan.workers.len()
    );
    let pool = build_thread_pool(plan.workers.len())?;

    log::info!("Dispatched {} workers", plan.workers.len());
    let results: Vec<VisualizerResult<()>> = pool.install(|| {
        plan.workers
            .par_iter()
            .map(|worker| {
                run_worker(worker, renderer, spectra, sinks, progress)
                    .map_err(|e| VisualizerError::worker(worker.worker, e))
            })
            .collect()
    });
    progress.finish();
    log::info!("Joined: {} frames written", progress.completed());

    results.into_iter().collect()
}

fn run_worker(
    worker: &WorkerPlan,
    renderer: &FrameRenderer,
    spectra: &Spectra,
    sinks: &dyn SinkFactory,
    progress: &Progress,
) -> VisualizerResult<()> {
    let mut sink = sinks.open(worker.worker, worker.frames())?;

    for chunk in &worker.chunks {
        log::debug!("Worker {} rendering frames {:?}", worker.worker, chunk.frames);
        let frames: Vec<Frame> = chunk
            .frames
            .clone()
            .map(|j| renderer.render(spectra.frame(j)))
            .collect();

        log::debug!("Worker {} writing frames {:?}", worker.worker, chunk.frames);
        for (index, frame) in chunk.frames.clone().zip(&frames) {
            sink.write_frame(index, frame)?;
        }
        progress.advance(chunk.len());
    }

    sink.finish()?;
    log::debug!("Worker {} done", worker.worker);
    Ok(())
}
