use std::ops::Range;
use std::path::{Path, PathBuf};

use super::sink::{FrameSink, SinkFactory};
use crate::error::VisualizerResult;
use crate::render::frame::Frame;

/// Writes every frame as `<dir>/<index>.png`.
pub struct ImageSequence {
    dir: PathBuf,
}

impl ImageSequence {
    pub fn create(dir: impl Into<PathBuf>) -> VisualizerResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{index}.png"))
}

impl SinkFactory for ImageSequence {
    fn open(&self, worker: usize, frames: Range<usize>) -> VisualizerResult<Box<dyn FrameSink>> {
        log::debug!("Worker {} writing frames {:?} to {}", worker, frames, self.dir.display());
        Ok(Box::new(PngWriter {
            dir: self.dir.clone(),
        }))
    }
}

struct PngWriter {
    dir: PathBuf,
}

impl FrameSink for PngWriter {
    fn write_frame(&mut self, index: usize, frame: &Frame) -> VisualizerResult<()> {
        frame.save_with_format(frame_path(&self.dir, index), image::ImageFormat::Png)?;
        Ok(())
    }

    fn finish(&mut self) -> VisualizerResult<()> {
        Ok(())
    }
}
