//! Runs the benchmarking executable and relays its output line by line.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::locator::ExecutableCandidate;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while relaying benchmark output: {0}")]
    Io(#[from] io::Error),
}

/// The program and argument vector for one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    name: String,
    args: Vec<OsString>,
}

impl Invocation {
    /// `<executable> -m <model>`. The model path should already be canonical.
    pub fn new(executable: &ExecutableCandidate, model: &Path) -> Self {
        Self {
            program: executable.path().to_path_buf(),
            name: executable.display_name(),
            args: vec![OsString::from("-m"), model.as_os_str().to_os_string()],
        }
    }

    /// Human-readable command line, using the bare name for search-path executables.
    pub fn command_line(&self) -> String {
        let mut line = self.name.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Run `invocation`, writing its combined stdout/stderr to `out` line by line.
///
/// Both streams share one pipe, so lines arrive in the order the child wrote them.
/// Lines are relayed byte for byte; a final line without a newline stays that way.
/// Returns the child's exit code, or `128 + signal` when it was killed by a signal.
/// The child is killed if this future is dropped before it exits.
pub async fn run<W: Write>(invocation: &Invocation, out: &mut W) -> Result<i32, RunError> {
    writeln!(out, "Running: {}", invocation.command_line())?;
    out.flush()?;

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.arg0(&invocation.name);
    let output = OutputPipe::attach(&mut command)?;

    tracing::info!(program = %invocation.program.display(), args = ?invocation.args, "spawning benchmark");
    let mut child = command.spawn().map_err(|source| RunError::Spawn {
        program: invocation.program.display().to_string(),
        source,
    })?;
    // The command still holds the parent's copies of the write ends; EOF needs them closed.
    drop(command);

    output.relay(&mut child, out).await?;

    let status = child.wait().await?;
    let code = exit_code(status);
    tracing::info!(code, "benchmark exited");
    if code != 0 {
        writeln!(out, "Error running localscore: exited with status {}", code)?;
    }
    Ok(code)
}

/// Where the child's output is read from.
#[cfg(unix)]
struct OutputPipe {
    reader: tokio::net::unix::pipe::Receiver,
}

#[cfg(unix)]
impl OutputPipe {
    /// Point the child's stdout and stderr at the write end of a single pipe.
    fn attach(command: &mut Command) -> io::Result<Self> {
        use nix::fcntl::{fcntl, FcntlArg, FdFlag};

        let (reader, writer) = nix::unistd::pipe()?;
        for fd in [&reader, &writer] {
            fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
        }
        let stderr = writer.try_clone()?;
        command.stdout(Stdio::from(writer)).stderr(Stdio::from(stderr));

        Ok(Self {
            reader: tokio::net::unix::pipe::Receiver::from_owned_fd(reader)?,
        })
    }

    async fn relay<W: Write>(self, _child: &mut Child, out: &mut W) -> io::Result<()> {
        let mut reader = BufReader::new(self.reader);
        let mut line = Vec::new();
        while reader.read_until(b'\n', &mut line).await? > 0 {
            relay_line(out, &line)?;
            line.clear();
        }
        Ok(())
    }
}

/// Without a shared descriptor the two streams are drained together and
/// interleave at line granularity.
#[cfg(not(unix))]
struct OutputPipe;

#[cfg(not(unix))]
impl OutputPipe {
    fn attach(command: &mut Command) -> io::Result<Self> {
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        Ok(Self)
    }

    async fn relay<W: Write>(self, child: &mut Child, out: &mut W) -> io::Result<()> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("child stderr was not captured"))?;

        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        let (mut out_line, mut err_line) = (Vec::new(), Vec::new());
        let (mut stdout_open, mut stderr_open) = (true, true);

        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout.read_until(b'\n', &mut out_line), if stdout_open => {
                    if read? == 0 {
                        stdout_open = false;
                    } else {
                        relay_line(out, &out_line)?;
                        out_line.clear();
                    }
                },
                read = stderr.read_until(b'\n', &mut err_line), if stderr_open => {
                    if read? == 0 {
                        stderr_open = false;
                    } else {
                        relay_line(out, &err_line)?;
                        err_line.clear();
                    }
                },
            }
        }
        Ok(())
    }
}

fn relay_line<W: Write>(out: &mut W, line: &[u8]) -> io::Result<()> {
    out.write_all(line)?;
    out.flush()
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
