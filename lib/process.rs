//! Running external programs.

use crate::error::{MtbError, MtbResult};
use crate::platform::filtered_path;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs a program to completion and returns its exit code and output lines.
#[async_trait]
pub trait CommandRunner: Send + Sync + fmt::Debug {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> MtbResult<(i32, Vec<String>)>;
}

/// [`CommandRunner`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

/// One line read from a child stream.
struct OutputLine {
    text: String,
    complete: bool,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> MtbResult<(i32, Vec<String>)> {
        run_cmd_capture_output(program, args, cwd, None).await
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Run `program` in `cwd`, merging stdout and stderr.
///
/// Every newline terminated line is passed to `on_line` as it arrives; a final
/// unterminated line is only part of the returned output. A missing exit code
/// (killed by a signal) is reported as 0.
pub async fn run_cmd_capture_output(
    program: &str,
    args: &[String],
    cwd: &Path,
    mut on_line: Option<&mut (dyn FnMut(&str) + Send)>,
) -> MtbResult<(i32, Vec<String>)> {
    let path = filtered_path(&std::env::var("PATH").unwrap_or_default());
    tracing::debug!("Running {} {:?} in {}", program, args, cwd.display());

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .env("PATH", path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| MtbError::Generic(format!("Failed to run {}: {}", program, e)))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx.clone()));
    }
    drop(tx);

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        if line.complete
            && let Some(callback) = on_line.as_mut()
        {
            callback(&line.text);
        }
        lines.push(line.text);
    }

    let status = child.wait().await?;
    Ok((status.code().unwrap_or(0), lines))
}

async fn forward_lines<R>(stream: R, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let complete = buf.ends_with(b"\n");
                let text = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                if tx.send(OutputLine { text, complete }).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("Stopped reading child output: {}", e);
                break;
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
