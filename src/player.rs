// Preview playback through an external player process (ffplay by default, mpv supported)
//
// The player runs without a window. Pausing kills the process and remembers the
// offset; resuming, seeking or changing volume while playing respawns it at the
// right offset. The position comes from the status lines the player prints on
// stderr, never from the wall clock.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::{Error, Result};
use crate::preview::{AudioBackend, AudioHandle};

#[derive(Debug, Clone, Copy, PartialEq)]
enum PlayerKind {
    Ffplay,
    Mpv,
    Generic,
}

impl PlayerKind {
    fn detect(program: &str) -> Self {
        let lower = program.to_lowercase();
        if lower.contains("ffplay") {
            PlayerKind::Ffplay
        } else if lower.contains("mpv") {
            PlayerKind::Mpv
        } else {
            PlayerKind::Generic
        }
    }
}

/// Spawns `program` for each preview
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
}

impl ProcessBackend {
    pub fn new(program: &str) -> Self {
        let program = if program.trim().is_empty() {
            crate::config::DEFAULT_PREVIEW_PLAYER.to_string()
        } else {
            program.trim().to_string()
        };
        Self { program: resolve_program(program) }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn set_program(&mut self, program: &str) {
        *self = Self::new(program);
    }
}

/// Auto-detect player paths on Windows
#[cfg(target_os = "windows")]
fn resolve_program(program: String) -> String {
    let candidates: &[&str] = match program.to_lowercase().as_str() {
        "ffplay" | "ffplay.exe" => &[
            r"C:\ffmpeg\bin\ffplay.exe",
            r"C:\Program Files\ffmpeg\bin\ffplay.exe",
        ],
        "mpv" | "mpv.exe" => &[
            r"C:\Program Files\mpv\mpv.exe",
            r"C:\Program Files (x86)\mpv\mpv.exe",
            r"C:\mpv\mpv.exe",
        ],
        _ => &[],
    };
    candidates
        .iter()
        .find(|path| std::path::Path::new(path).exists())
        .map(|s| s.to_string())
        .unwrap_or(program)
}

#[cfg(not(target_os = "windows"))]
fn resolve_program(program: String) -> String {
    program
}

/// What the player printed on stderr: its last reported position and last other line
#[derive(Debug, Default)]
struct PlayerOutput {
    position: Option<f32>,
    last_line: String,
}

impl PlayerOutput {
    fn record(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match parse_progress(line) {
            Some(position) => self.position = Some(position),
            None => self.last_line = line.to_string(),
        }
    }
}

/// Playback clock from a status line.
///
/// ffplay `-stats` prints `  12.34 M-A:  0.000 fd=...`; mpv with
/// `--term-status-msg=${=time-pos}` prints the bare number.
fn parse_progress(line: &str) -> Option<f32> {
    let mut tokens = line.split_whitespace();
    let clock = tokens.next()?.parse::<f32>().ok()?;
    let status_line = match tokens.next() {
        None => true,
        Some(next) => next.ends_with(':'),
    };
    (status_line && clock.is_finite() && clock >= 0.0).then_some(clock)
}

/// Drain the player's stderr until it exits
fn watch_output(stderr: ChildStderr, output: Arc<Mutex<PlayerOutput>>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut chunk = Vec::new();
        loop {
            chunk.clear();
            // Status lines are terminated by '\r', log lines by '\n'
            match reader.read_until(b'\r', &mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&chunk);
                    if let Ok(mut out) = output.lock() {
                        for line in text.split('\n') {
                            out.record(line);
                        }
                    }
                }
            }
        }
    });
}

impl AudioBackend for ProcessBackend {
    type Handle = ProcessHandle;

    fn open(&mut self, url: &str) -> Result<ProcessHandle> {
        if url.is_empty() {
            return Err(Error::Player("track has no preview".to_string()));
        }
        Ok(ProcessHandle {
            program: self.program.clone(),
            kind: PlayerKind::detect(&self.program),
            url: url.to_string(),
            child: None,
            output: None,
            offset: 0.0,
            volume: 1.0,
            exit: None,
        })
    }
}

pub struct ProcessHandle {
    program: String,
    kind: PlayerKind,
    url: String,
    child: Option<Child>,
    output: Option<Arc<Mutex<PlayerOutput>>>,
    /// Position the current (or next) process starts from
    offset: f32,
    volume: f32,
    /// How the last process ended on its own; `Err` carries the failure
    exit: Option<std::result::Result<(), String>>,
}

impl ProcessHandle {
    fn args(&self) -> Vec<String> {
        let volume = (self.volume.clamp(0.0, 1.0) * 100.0).round() as u32;
        match self.kind {
            // ffplay takes input directly, not with -i flag
            PlayerKind::Ffplay => vec![
                self.url.clone(),
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(), "error".to_string(),
                "-stats".to_string(),
                "-ss".to_string(), format!("{:.2}", self.offset),
                "-volume".to_string(), volume.to_string(),
            ],
            PlayerKind::Mpv => vec![
                "--no-video".to_string(),
                "--msg-level=all=error,statusline=status".to_string(),
                "--term-status-msg=${=time-pos}".to_string(),
                format!("--start={:.2}", self.offset),
                format!("--volume={}", volume),
                self.url.clone(),
            ],
            PlayerKind::Generic => vec![self.url.clone()],
        }
    }

    fn spawn(&mut self) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args());

        // On Windows, hide the console window for ffplay
        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Player(format!("failed to launch '{}': {}", self.program, e)))?;
        tracing::debug!("Preview player launched (PID: {}) at {:.1}s", child.id(), self.offset);

        let output = Arc::new(Mutex::new(PlayerOutput::default()));
        if let Some(stderr) = child.stderr.take() {
            watch_output(stderr, Arc::clone(&output));
        }
        self.child = Some(child);
        self.output = Some(output);
        self.exit = None;
        Ok(())
    }

    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait(); // Reap the process
        }
        self.output = None;
    }

    fn last_output_line(&self) -> String {
        self.output
            .as_ref()
            .and_then(|o| o.lock().ok().map(|o| o.last_line.clone()))
            .unwrap_or_default()
    }

    fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Respawn at the current position so new settings take effect
    fn restart(&mut self) -> Result<()> {
        if self.is_running() {
            self.offset = self.position();
            self.kill();
            self.spawn()?;
        }
        Ok(())
    }
}

impl AudioHandle for ProcessHandle {
    fn play(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.spawn()
    }

    fn pause(&mut self) {
        self.offset = self.position();
        self.kill();
    }

    fn seek(&mut self, seconds: f32) -> Result<()> {
        self.offset = seconds.max(0.0);
        if self.is_running() {
            self.kill();
            self.spawn()?;
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        if (volume - self.volume).abs() < f32::EPSILON {
            return Ok(());
        }
        self.volume = volume;
        self.restart()
    }

    /// Last clock the player reported; the start offset until it reports one
    fn position(&self) -> f32 {
        self.output
            .as_ref()
            .and_then(|o| o.lock().ok().and_then(|o| o.position))
            .unwrap_or(self.offset)
    }

    fn finished(&mut self) -> Option<Result<()>> {
        let status = match self.child.as_mut().map(|child| child.try_wait()) {
            Some(Ok(Some(status))) => Ok(status),
            Some(Err(e)) => Err(e.to_string()),
            Some(Ok(None)) | None => return self.exit.clone().map(|r| r.map_err(Error::Player)),
        };

        self.offset = self.position();
        let detail = self.last_output_line();
        self.child = None;
        self.output = None;
        self.exit = Some(match status {
            Ok(status) if status.success() => {
                tracing::debug!("Preview player exited: {}", status);
                Ok(())
            }
            Ok(status) if detail.is_empty() => Err(format!("'{}' exited with {}", self.program, status)),
            Ok(status) => Err(format!("'{}' exited with {}: {}", self.program, status, detail)),
            Err(e) => Err(format!("lost track of '{}': {}", self.program, e)),
        });
        self.exit.clone().map(|r| r.map_err(Error::Player))
    }

    fn release(&mut self) {
        self.kill();
        self.exit = None;
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.kill();
    }
}
