use std::io::{Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use super::sink::{FrameSink, SinkFactory};
use crate::error::{VisualizerError, VisualizerResult};
use crate::render::frame::Frame;

/// Codec settings shared by every segment of a run.
#[derive(Clone, Debug)]
pub struct EncoderSettings {
    pub program: String,
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    pub bitrate: Option<String>,
}

/// Command encoding raw `rgb24` frames from stdin into `output`, video only.
pub fn encoder_command(settings: &EncoderSettings, output: &Path) -> Command {
    let mut cmd = Command::new(&settings.program);
    cmd.args(["-y", "-loglevel", "error"])
        .args(["-f", "rawvideo", "-pixel_format", "rgb24"])
        .args(["-video_size", format!("{}x{}", settings.width, settings.height).as_str()])
        .args(["-framerate", settings.framerate.to_string().as_str()])
        .args(["-i", "pipe:0", "-an"])
        .args(["-c:v", settings.codec.as_str(), "-pix_fmt", settings.pix_fmt.as_str()]);

    if let Some(br) = &settings.bitrate {
        cmd.args(["-b:v", br.as_str()]);
    } else {
        cmd.args(["-crf", settings.crf.to_string().as_str(), "-preset", "medium"]);
    }
    cmd.arg(output);
    cmd
}

/// Per-worker `part_<w>.mp4` segments under one directory.
pub struct VideoSegments {
    parts_dir: PathBuf,
    settings: EncoderSettings,
}

impl VideoSegments {
    pub fn create(parts_dir: impl Into<PathBuf>, settings: EncoderSettings) -> VisualizerResult<Self> {
        let parts_dir = parts_dir.into();
        std::fs::create_dir_all(&parts_dir)?;
        Ok(Self { parts_dir, settings })
    }
}

pub fn segment_file_name(worker: usize) -> String {
    format!("part_{worker}.mp4")
}

impl SinkFactory for VideoSegments {
    fn open(&self, worker: usize, frames: Range<usize>) -> VisualizerResult<Box<dyn FrameSink>> {
        let output = self.parts_dir.join(segment_file_name(worker));
        log::debug!("Worker {} encoding frames {:?} into {}", worker, frames, output.display());
        Ok(Box::new(SegmentEncoder::spawn(&self.settings, &output)?))
    }
}

/// One `ffmpeg` child fed through its stdin.
pub struct SegmentEncoder {
    tool: String,
    frame_bytes: usize,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl SegmentEncoder {
    pub fn spawn(settings: &EncoderSettings, output: &Path) -> VisualizerResult<Self> {
        let mut child = encoder_command(settings, output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdin = child.stdin.take();
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                stderr.read_to_end(&mut bytes)?;
                Ok(bytes)
            })
        });

        Ok(Self {
            tool: settings.program.clone(),
            frame_bytes: settings.width as usize * settings.height as usize * 3,
            child: Some(child),
            stdin,
            stderr_drain,
        })
    }

    /// Close stdin, wait for the child and collect what it printed.
    fn wait(&mut self) -> VisualizerResult<(ExitStatus, String)> {
        drop(self.stdin.take());
        let status = match self.child.take() {
            Some(mut child) => child.wait()?,
            None => {
                return Err(VisualizerError::configuration(format!(
                    "{} segment encoder already finished",
                    self.tool
                )))
            }
        };
        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle.join().ok().and_then(Result::ok).unwrap_or_default(),
            None => Vec::new(),
        };
        Ok((status, String::from_utf8_lossy(&stderr).trim().to_string()))
    }

    fn exit_error(&self, status: ExitStatus, stderr: String) -> VisualizerError {
        VisualizerError::ExternalTool {
            tool: self.tool.clone(),
            status,
            stderr,
        }
    }
}

impl FrameSink for SegmentEncoder {
    fn write_frame(&mut self, index: usize, frame: &Frame) -> VisualizerResult<()> {
        let pixels = frame.as_raw();
        if pixels.len() != self.frame_bytes {
            return Err(VisualizerError::configuration(format!(
                "frame {} is {}x{}, which does not match the encoder size",
                index,
                frame.width(),
                frame.height()
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VisualizerError::configuration("segment encoder stdin is closed"));
        };
        if let Err(err) = stdin.write_all(pixels) {
            // A broken pipe means the encoder died; its exit status says why.
            let (status, stderr) = self.wait()?;
            if !status.success() {
                return Err(self.exit_error(status, stderr));
            }
            return Err(err.into());
        }
        Ok(())
    }

    fn finish(&mut self) -> VisualizerResult<()> {
        let (status, stderr) = self.wait()?;
        if !status.success() {
            return Err(self.exit_error(status, stderr));
        }
        Ok(())
    }
}

impl Drop for SegmentEncoder {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
