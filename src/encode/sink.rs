use std::ops::Range;

use crate::error::VisualizerResult;
use crate::render::frame::Frame;

/// Destination for the frames of one worker's block.
pub trait FrameSink: Send {
    /// Push one frame; indices are global and strictly increasing per sink.
    fn write_frame(&mut self, index: usize, frame: &Frame) -> VisualizerResult<()>;
    /// Called once after the worker's last frame.
    fn finish(&mut self) -> VisualizerResult<()>;
}

/// Opens one sink per worker. Shared by all workers of a run.
pub trait SinkFactory: Sync {
    fn open(&self, worker: usize, frames: Range<usize>) -> VisualizerResult<Box<dyn FrameSink>>;
}
