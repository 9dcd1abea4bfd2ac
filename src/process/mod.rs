use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;

#[cfg(test)]
pub mod testing;

/// Placeholder used when a failed tool printed nothing at all.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Receives stderr segments while a child process is still running.
pub type LineSender = mpsc::UnboundedSender<String>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("{program} exited with status {code}: {message}")]
    Exit {
        program: String,
        code: i32,
        message: String,
    },
    #[error("Failed to run {program}: {message}")]
    Launch { program: String, message: String },
}

impl ProcessError {
    /// Text shown to the user for this failure.
    pub fn diagnostic(&self) -> &str {
        match self {
            Self::Exit { message, .. } | Self::Launch { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputCapture {
    /// stderr followed by stdout.
    #[default]
    Merged,
    StdoutOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub capture: OutputCapture,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            capture: OutputCapture::Merged,
        }
    }

    pub fn stdout_only(mut self) -> Self {
        self.capture = OutputCapture::StdoutOnly;
        self
    }

    /// Shell-like rendering for logs.
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.contains(char::is_whitespace) {
                    format!("\"{}\"", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs external commands to completion.
///
/// One attempt per call, no retry and no timeout. Implementations resolve to
/// the captured output on exit status 0 and to a [`ProcessError`] otherwise.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        invocation: Invocation,
        line_sink: Option<LineSender>,
    ) -> Result<String, ProcessError>;
}

#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        invocation: Invocation,
        line_sink: Option<LineSender>,
    ) -> Result<String, ProcessError> {
        let launch_error = |e: std::io::Error| ProcessError::Launch {
            program: invocation.program.clone(),
            message: e.to_string(),
        };

        tracing::debug!("Running {}", invocation.display_command());

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch_error)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr) = tokio::try_join!(
            read_stream(stdout, None),
            read_stream(stderr, line_sink)
        )
        .map_err(launch_error)?;

        let status = child.wait().await.map_err(launch_error)?;

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        if status.success() {
            Ok(match invocation.capture {
                OutputCapture::Merged => merge_output(&stdout, &stderr),
                OutputCapture::StdoutOnly => stdout,
            })
        } else {
            // Terminated by a signal: no code to report.
            let code = status.code().unwrap_or(-1);
            tracing::debug!("{} exited with status {}", invocation.program, code);
            Err(ProcessError::Exit {
                program: invocation.program,
                code,
                message: failure_message(&stdout, &stderr),
            })
        }
    }
}

async fn read_stream<R>(reader: Option<R>, line_sink: Option<LineSender>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };

    let mut collected = Vec::new();
    let mut splitter = LineSplitter::default();
    let mut chunk = [0u8; 4096];

    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..read]);

        if let Some(sink) = &line_sink {
            for line in splitter.push(&chunk[..read]) {
                // The receiver going away must not abort the child.
                let _ = sink.send(line);
            }
        }
    }

    if let (Some(sink), Some(line)) = (&line_sink, splitter.finish()) {
        let _ = sink.send(line);
    }

    Ok(collected)
}

/// Splits a byte stream on `\n` and `\r`; FFmpeg rewrites its status line with
/// carriage returns.
#[derive(Debug, Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' || byte == b'\r' {
                self.flush_into(&mut lines);
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        let mut lines = Vec::new();
        self.flush_into(&mut lines);
        lines.pop()
    }

    fn flush_into(&mut self, lines: &mut Vec<String>) {
        if self.pending.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        if !line.is_empty() {
            lines.push(line);
        }
    }
}

/// stderr then stdout, with a newline between them only when stderr is
/// non-empty and does not already end in one.
pub fn merge_output(stdout: &str, stderr: &str) -> String {
    let mut merged = String::with_capacity(stdout.len() + stderr.len() + 1);
    merged.push_str(stderr);
    if !stderr.is_empty() && !stderr.ends_with('\n') {
        merged.push('\n');
    }
    merged.push_str(stdout);
    merged
}

/// Best available diagnostic for a failed run: stderr, else stdout, else
/// [`UNKNOWN_ERROR`].
pub fn failure_message(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    let stdout = stdout.trim();
    if !stderr.is_empty() {
        stderr.to_string()
    } else if !stdout.is_empty() {
        stdout.to_string()
    } else {
        UNKNOWN_ERROR.to_string()
    }
}

/// Asks a tool for its version using stdout-only capture and returns the
/// third token of the first line (`ffmpeg version 6.1.1 ...`).
pub async fn tool_version<R>(runner: &R, program: &str) -> Result<String, ProcessError>
where
    R: CommandRunner + ?Sized,
{
    let output = runner
        .run(Invocation::new(program, ["-version"]).stdout_only(), None)
        .await?;

    Ok(output
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(2))
        .unwrap_or("unknown")
        .to_string())
}
