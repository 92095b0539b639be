//! Subprocess invocation
//!
//! Two execution paths share one `Invocation` builder: a captured path
//! for quiet runs and a streaming path that delivers output line by
//! line, tagged by stream, while still capturing everything. The
//! streaming path reads stdout and stderr on separate threads so a
//! full OS pipe buffer on one stream can never block the subprocess
//! while the reader waits on the other.

use gantry_core::{Error, Result};
use indexmap::IndexMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;

/// Which pipe a streamed line arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl StreamKind {
    /// Stream name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

/// Captured output of a finished subprocess
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Everything the process wrote to stdout
    pub stdout: String,
    /// Everything the process wrote to stderr
    pub stderr: String,
    /// Exit code, when the process exited normally
    pub code: Option<i32>,
    /// Whether the process exited with status zero
    pub success: bool,
}

impl ProcessOutput {
    /// Both streams concatenated, stdout first
    #[must_use]
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        if self.stdout.is_empty() {
            return self.stderr.clone();
        }
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        combined.push_str(&self.stdout);
        if !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&self.stderr);
        combined
    }
}

/// One subprocess invocation: program, arguments, working directory
/// and extra environment
#[derive(Debug, Clone)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    cwd: PathBuf,
    env: IndexMap<String, String>,
}

impl Invocation {
    /// Create an invocation running in `cwd`
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: IndexMap::new(),
        }
    }

    /// Append arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add extra environment variables (inherits the parent env)
    #[must_use]
    pub fn envs(mut self, vars: &IndexMap<String, String>) -> Self {
        for (k, v) in vars {
            self.env.insert(k.clone(), v.clone());
        }
        self
    }

    /// The program being invoked
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run to completion, capturing both streams
    ///
    /// A non-zero exit is data (`success == false`), not an error;
    /// `Err` means the process could not be launched or waited on.
    #[tracing::instrument(skip(self), fields(program = %self.program.display()))]
    pub fn run_captured(&self) -> Result<ProcessOutput> {
        let mut expr = duct::cmd(&self.program, &self.args)
            .dir(&self.cwd)
            .stdout_capture()
            .stderr_capture()
            .unchecked();

        for (key, value) in &self.env {
            expr = expr.env(key, value);
        }

        let output = expr.run().map_err(|e| {
            Error::TaskExecution(format!(
                "Failed to run {}: {e}",
                self.program.display()
            ))
        })?;

        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
            success: output.status.success(),
        })
    }

    /// Run to completion, invoking `on_line` for every output line as
    /// it arrives, tagged by stream, while also capturing everything
    ///
    /// Both pipes are drained concurrently on dedicated threads; the
    /// callback runs on the calling thread in arrival order.
    #[tracing::instrument(skip(self, on_line), fields(program = %self.program.display()))]
    pub fn run_streaming<F>(&self, mut on_line: F) -> Result<ProcessOutput>
    where
        F: FnMut(StreamKind, &str),
    {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .envs(self.env.iter().map(|(k, v)| (k.clone(), v.clone())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::TaskExecution(format!(
                    "Failed to spawn {}: {e}",
                    self.program.display()
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::TaskExecution("stdout pipe missing".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::TaskExecution("stderr pipe missing".to_string()))?;

        let (tx, rx) = mpsc::channel::<(StreamKind, String)>();
        let stdout_pump = spawn_reader(stdout, StreamKind::Stdout, tx.clone());
        let stderr_pump = spawn_reader(stderr, StreamKind::Stderr, tx);

        let mut stdout_buf = String::new();
        let mut stderr_buf = String::new();

        // The channel closes once both pumps hit EOF and drop their
        // senders.
        for (kind, line) in rx {
            on_line(kind, &line);
            let buf = match kind {
                StreamKind::Stdout => &mut stdout_buf,
                StreamKind::Stderr => &mut stderr_buf,
            };
            buf.push_str(&line);
            buf.push('\n');
        }

        let _ = stdout_pump.join();
        let _ = stderr_pump.join();

        let status = child.wait().map_err(|e| {
            Error::TaskExecution(format!(
                "Failed to wait on {}: {e}",
                self.program.display()
            ))
        })?;

        Ok(ProcessOutput {
            stdout: stdout_buf,
            stderr: stderr_buf,
            code: status.code(),
            success: status.success(),
        })
    }

    /// Run captured, or streaming with a live echo when `verbose`
    pub fn run(&self, verbose: bool) -> Result<ProcessOutput> {
        if verbose {
            self.run_streaming(|kind, line| match kind {
                StreamKind::Stdout => {
                    let mut out = std::io::stdout().lock();
                    let _ = writeln!(out, "{line}");
                }
                StreamKind::Stderr => {
                    let mut err = std::io::stderr().lock();
                    let _ = writeln!(err, "{line}");
                }
            })
        } else {
            self.run_captured()
        }
    }
}

fn spawn_reader<R>(
    reader: R,
    kind: StreamKind,
    tx: mpsc::Sender<(StreamKind, String)>,
) -> std::thread::JoinHandle<()>
where
    R: std::io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let buffered = BufReader::new(reader);
        for line in buffered.lines() {
            match line {
                Ok(line) => {
                    if tx.send((kind, line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(stream = kind.name(), error = %e, "Pipe read error");
                    break;
                }
            }
        }
    })
}
