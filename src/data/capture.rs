/// Webcam capture via an external grabber program
///
/// A single frame is requested from the capture program (ffmpeg by default)
/// and read back as PNG on stdout.

use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use super::buffer::ImageBuffer;
use super::io::decode_bytes;
use crate::pipeline::error::{PipelineError, PipelineResult};

/// Where and how to grab a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Grabber executable
    pub program: String,
    /// ffmpeg input format (`v4l2`, `avfoundation`, `dshow`)
    pub input_format: String,
    pub device: String,
    /// Give up on the grabber after this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

/// How often a running grabber is checked for exit
const POLL_INTERVAL: Duration = Duration::from_millis(20);

impl Default for CaptureSettings {
    fn default() -> Self {
        let (input_format, device) = if cfg!(target_os = "macos") {
            ("avfoundation", "0")
        } else if cfg!(target_os = "windows") {
            ("dshow", "video=Integrated Camera")
        } else {
            ("v4l2", "/dev/video0")
        };
        Self {
            program: "ffmpeg".to_string(),
            input_format: input_format.to_string(),
            device: device.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CaptureSettings {
    /// Command that writes one PNG frame to stdout
    pub fn frame_command(&self) -> CaptureCommand {
        CaptureCommand::new(&self.program)
            .args(&["-hide_banner", "-loglevel", "error"])
            .args(&["-f", self.input_format.as_str(), "-i", self.device.as_str()])
            .args(&["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png"])
            .arg("-")
            .timeout(Duration::from_secs(self.timeout_secs.max(1)))
            .describe(&format!("grab one frame from {}", self.device))
    }
}

/// Builder for a capture subprocess
#[derive(Debug, Clone)]
pub struct CaptureCommand {
    pub program: String,
    pub args: Vec<String>,
    pub description: String,
    pub timeout: Option<Duration>,
}

impl CaptureCommand {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            description: String::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn describe(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Build the command string for logging/display
    pub fn to_command_string(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.clone());
        parts.join(" ")
    }

    /// Run to completion and return stdout; a non-zero exit is an error.
    /// With a timeout set, a process still running at the deadline is killed
    /// and `ErrorKind::TimedOut` is returned.
    pub fn execute_piped(&self) -> io::Result<Vec<u8>> {
        if self.description.is_empty() {
            log::info!("Executing: {}", self.to_command_string());
        } else {
            log::info!("{}: {}", self.description, self.to_command_string());
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes off-thread so a chatty child cannot block on a full pipe
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit)?,
            None => Some(child.wait()?),
        };
        let stdout = join_reader(stdout);
        let stderr = join_reader(stderr);

        let status = match status {
            Some(status) => status,
            None => {
                log::warn!(
                    "Command timed out after {:?}: {}",
                    self.timeout.unwrap_or_default(),
                    self.to_command_string()
                );
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!(
                        "{} gave no frame within {} s",
                        self.program,
                        self.timeout.unwrap_or_default().as_secs_f32()
                    ),
                ));
            }
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            log::warn!(
                "Command failed (exit {}): {}\nstderr: {}",
                status.code().unwrap_or(-1),
                self.to_command_string(),
                stderr
            );
            return Err(io::Error::other(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                stderr.trim()
            )));
        }

        Ok(stdout)
    }
}

/// Poll the child until it exits or `limit` elapses. `Ok(None)` means the
/// child was killed at the deadline.
fn wait_with_deadline(
    child: &mut Child,
    limit: Duration,
) -> io::Result<Option<std::process::ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            // The child may exit on its own between try_wait and kill
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<thread::JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut buf) {
                log::debug!("Pipe read ended early: {}", e);
            }
            buf
        })
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Grab a single RGB frame from the configured device
pub fn capture_frame(settings: &CaptureSettings) -> PipelineResult<ImageBuffer> {
    let label = format!("camera {}", settings.device);
    let bytes = settings
        .frame_command()
        .execute_piped()
        .map_err(|e| PipelineError::decode(&label, e))?;
    decode_bytes(&bytes, &label)
}

/// Check whether the grabber program can be started at all
pub fn check_capture_available(settings: &CaptureSettings) -> bool {
    Command::new(&settings.program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_command_shape() {
        let settings = CaptureSettings {
            program: "ffmpeg".to_string(),
            input_format: "v4l2".to_string(),
            device: "/dev/video2".to_string(),
            timeout_secs: 5,
        };
        let cmd = settings.frame_command().to_command_string();
        assert!(cmd.starts_with("ffmpeg "));
        assert!(cmd.contains("-f v4l2 -i /dev/video2"));
        assert!(cmd.contains("-frames:v 1"));
        assert!(cmd.ends_with(" -"));
        assert_eq!(settings.frame_command().timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_missing_program_is_decode_failure() {
        let settings = CaptureSettings {
            program: format!("no-such-grabber-{}", uuid::Uuid::new_v4()),
            ..CaptureSettings::default()
        };
        assert!(!check_capture_available(&settings));
        let err = capture_frame(&settings).unwrap_err();
        assert!(matches!(err, PipelineError::DecodeFailure { .. }));
    }

    #[test]
    fn test_builder_collects_args() {
        let cmd = CaptureCommand::new("grab").arg("-a").args(&["-b", "c"]).describe("test");
        assert_eq!(cmd.args, vec!["-a", "-b", "c"]);
        assert_eq!(cmd.to_command_string(), "grab -a -b c");
        assert_eq!(cmd.description, "test");
        assert_eq!(cmd.timeout, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_stalled_grabber_is_killed_at_deadline() {
        let cmd = CaptureCommand::new("sleep")
            .arg("30")
            .timeout(Duration::from_millis(300))
            .describe("stalled grabber");
        let started = Instant::now();
        let err = cmd.execute_piped().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_does_not_cut_off_fast_command() {
        let out = CaptureCommand::new("echo")
            .arg("frame")
            .timeout(Duration::from_secs(10))
            .execute_piped()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "frame");
    }

    #[test]
    fn test_settings_without_timeout_use_default() {
        let json = r#"{"program":"ffmpeg","input_format":"v4l2","device":"/dev/video0"}"#;
        let settings: CaptureSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.timeout_secs, 10);
    }
}
