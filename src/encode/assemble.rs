use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;

use super::ffmpeg::segment_file_name;
use crate::error::{VisualizerError, VisualizerResult};

pub const MANIFEST_NAME: &str = "parts.txt";

/// Slice of the source audio muxed under the concatenated video.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub start: f64,
    pub duration: f64,
}

/// Joins the per-worker segments into the final video.
#[derive(Clone, Debug)]
pub struct Assembler {
    pub program: String,
    pub parts_dir: PathBuf,
    pub destination: PathBuf,
    pub audio: Option<AudioTrack>,
}

impl Assembler {
    /// Write the concat list naming `part_0.mp4 .. part_<workers-1>.mp4` in order.
    pub fn write_manifest(&self, workers: usize) -> VisualizerResult<PathBuf> {
        let path = self.parts_dir.join(MANIFEST_NAME);
        let mut file = fs::File::create(&path)?;
        for worker in 0..workers {
            writeln!(file, "file '{}'", segment_file_name(worker))?;
        }
        Ok(path)
    }

    pub fn command(&self, manifest: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-loglevel", "error", "-f", "concat", "-safe", "0", "-i"])
            .arg(manifest);

        match &self.audio {
            Some(audio) => {
                cmd.args(["-ss", audio.start.to_string().as_str()])
                    .args(["-t", audio.duration.to_string().as_str()])
                    .arg("-i")
                    .arg(&audio.path)
                    .args(["-map", "0:v:0", "-map", "1:a:0"])
                    .args(["-c:v", "copy", "-c:a", "aac", "-shortest"]);
            }
            None => {
                cmd.args(["-c:v", "copy"]);
            }
        }
        cmd.arg(&self.destination);
        cmd
    }

    /// Concatenate (and mux) into the destination. On failure a destination
    /// written by this run is removed; an untouched earlier file is kept.
    pub fn run(&self, workers: usize) -> VisualizerResult<()> {
        let manifest = self.write_manifest(workers)?;
        let before = modified(&self.destination);
        log::info!(
            "Assembling {} segments into {}",
            workers,
            self.destination.display()
        );

        let output = self
            .command(&manifest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            let after = modified(&self.destination);
            if after.is_some() && after != before {
                log::debug!("Removing partial {}", self.destination.display());
                let _ = fs::remove_file(&self.destination);
            }
            return Err(VisualizerError::ExternalTool {
                tool: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    pub fn remove_parts(&self) -> VisualizerResult<()> {
        log::debug!("Removing {}", self.parts_dir.display());
        fs::remove_dir_all(&self.parts_dir)?;
        Ok(())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
