//! Remote shell subprocess with split read/write support.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, ExitStatus};

/// Owns an active remote shell subprocess and exposes its stdio handles.
pub struct SshConnection {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
}

impl SshConnection {
    pub(super) const fn new(child: Child, stdin: Option<ChildStdin>, stdout: ChildStdout) -> Self {
        Self {
            child: Some(child),
            stdin,
            stdout: Some(stdout),
        }
    }

    /// Flushes and closes the stdin pipe, signalling EOF to the subprocess.
    pub fn close_stdin(&mut self) -> io::Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin.flush()?;
        }
        Ok(())
    }

    /// Waits for the subprocess to exit, consuming the connection.
    pub fn wait(mut self) -> io::Result<ExitStatus> {
        let _ = self.close_stdin();
        self.stdout.take();
        match self.child.take() {
            Some(mut child) => child.wait(),
            None => Err(child_gone()),
        }
    }

    /// Splits the connection into a reader, a writer, and a process handle.
    pub fn split(mut self) -> io::Result<(SshReader, SshWriter, SshChildHandle)> {
        let stdin = self.stdin.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "stdin has already been closed")
        })?;
        let stdout = self.stdout.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "stdout has already been taken")
        })?;
        let child = self.child.take().ok_or_else(child_gone)?;

        Ok((
            SshReader { stdout },
            SshWriter { stdin },
            SshChildHandle { child: Some(child) },
        ))
    }
}

fn child_gone() -> io::Error {
    io::Error::other("remote shell process has already been reaped")
}

/// Read half of a remote shell connection (subprocess stdout).
pub struct SshReader {
    stdout: ChildStdout,
}

impl Read for SshReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdout.read(buf)
    }
}

/// Write half of a remote shell connection (subprocess stdin).
pub struct SshWriter {
    stdin: ChildStdin,
}

impl Write for SshWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdin.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdin.flush()
    }
}

/// Handle used to reap the remote shell once the exchange is over.
///
/// Dropping an unreaped handle kills the subprocess.
pub struct SshChildHandle {
    child: Option<Child>,
}

impl SshChildHandle {
    /// Waits for the subprocess to exit.
    pub fn wait(mut self) -> io::Result<ExitStatus> {
        match self.child.take() {
            Some(mut child) => child.wait(),
            None => Err(child_gone()),
        }
    }

    /// Kills the subprocess if it is still running and reaps it.
    pub fn terminate(mut self) -> io::Result<()> {
        if let Some(mut child) = self.child.take() {
            kill_and_reap(&mut child)?;
        }
        Ok(())
    }
}

impl Drop for SshChildHandle {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = kill_and_reap(&mut child);
        }
    }
}

impl Read for SshConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stdout.as_mut() {
            Some(stdout) => stdout.read(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stdout has already been taken",
            )),
        }
    }
}

impl Write for SshConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stdin has already been closed",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for SshConnection {
    fn drop(&mut self) {
        let _ = self.close_stdin();
        if let Some(mut child) = self.child.take() {
            let _ = kill_and_reap(&mut child);
        }
    }
}

fn kill_and_reap(child: &mut Child) -> io::Result<()> {
    if child.try_wait()?.is_none() {
        let _ = child.kill();
    }
    child.wait().map(drop)
}
