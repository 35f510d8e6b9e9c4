//! Request state machine layered on top of a reader/writer pair.
//!
//! A session talks to one peer `scp` process. In [`ScpMode::Read`] the peer
//! runs `scp -f` and this side is the sink: it pulls requests, accepts them
//! and reads file payload. In [`ScpMode::Write`] the peer runs `scp -t` and
//! this side is the source: it announces files and directories and writes
//! their payload.
//!
//! ```text
//! read:  init -> (pull_request -> accept_request -> read*)* -> close
//! write: init -> (push_directory | push_file -> write* | leave_directory)* -> close
//! ```

use std::io::{self, BufRead, BufReader, Read, Write};

use memchr::memchr;

use crate::ScpError;
use crate::protocol::{
    ControlRecord, MAX_CONTROL_LINE, MODE_MASK, RESPONSE_ERROR, RESPONSE_OK, RESPONSE_WARNING,
    Response, quote_remote_path, validate_name,
};

/// Direction of an scp exchange, seen from this side.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScpMode {
    /// This side receives (`scp -f` on the peer).
    Read,
    /// This side sends (`scp -t` on the peer).
    Write,
}

impl ScpMode {
    const fn peer_flag(self) -> &'static str {
        match self {
            Self::Read => "-f",
            Self::Write => "-t",
        }
    }
}

/// Parameters of the peer `scp` invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScpRequest {
    mode: ScpMode,
    recursive: bool,
    path: String,
    program: String,
}

impl ScpRequest {
    /// Creates a request for `path` on the peer.
    #[must_use]
    pub fn new(mode: ScpMode, recursive: bool, path: impl Into<String>) -> Self {
        Self {
            mode,
            recursive,
            path: path.into(),
            program: "scp".to_owned(),
        }
    }

    /// Overrides the program name executed on the peer.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Returns the exchange direction.
    #[must_use]
    pub const fn mode(&self) -> ScpMode {
        self.mode
    }

    /// Reports whether directories may be transferred.
    #[must_use]
    pub const fn recursive(&self) -> bool {
        self.recursive
    }

    /// Returns the path on the peer.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Renders the command line executed by the remote shell.
    #[must_use]
    pub fn remote_command(&self) -> String {
        let mut command = format!("{} {}", self.program, self.mode.peer_flag());
        if self.recursive {
            command.push_str(" -r");
        }
        command.push_str(" -- ");
        command.push_str(&quote_remote_path(&self.path));
        command
    }
}

/// Event produced by [`ScpSession::pull_request`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PullEvent {
    /// The peer offers a regular file.
    NewFile {
        /// Entry name.
        name: String,
        /// Payload length in bytes.
        size: u64,
        /// Permission bits.
        mode: u32,
    },
    /// The peer offers a directory; subsequent events belong to it.
    NewDirectory {
        /// Entry name.
        name: String,
        /// Permission bits.
        mode: u32,
    },
    /// The innermost directory is complete.
    EndOfDirectory,
    /// The peer reported a non-fatal problem.
    Warning(String),
    /// The peer closed the stream.
    EndOfStream,
    /// The peer sent a byte that starts no known record.
    Unexpected(u8),
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Pending {
    File { name: String, size: u64, mode: u32 },
    Directory { name: String, mode: u32 },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    New,
    Ready,
    Requested,
    ReadingFile { remaining: u64 },
    WritingFile { remaining: u64 },
    Drained,
    Failed,
    Closed,
}

/// scp exchange over a reader and a writer.
pub struct ScpSession<R, W> {
    mode: ScpMode,
    reader: BufReader<R>,
    writer: W,
    state: State,
    pending: Option<Pending>,
    open_directories: usize,
}

impl<R: Read, W: Write> ScpSession<R, W> {
    /// Wraps the peer's output (`reader`) and input (`writer`).
    pub fn new(mode: ScpMode, reader: R, writer: W) -> Self {
        Self {
            mode,
            reader: BufReader::new(reader),
            writer,
            state: State::New,
            pending: None,
            open_directories: 0,
        }
    }

    /// Returns the exchange direction.
    #[must_use]
    pub const fn mode(&self) -> ScpMode {
        self.mode
    }

    /// Performs the opening handshake.
    ///
    /// A sink signals readiness with a single `\0`; a source waits for that
    /// byte from the peer.
    pub fn init(&mut self) -> Result<(), ScpError> {
        self.expect_state(State::New, "session is already initialized")?;
        let result = match self.mode {
            ScpMode::Read => self.send_ok(),
            ScpMode::Write => self.read_response(),
        };
        self.track(result)?;
        tracing::trace!(target: "scp::proto", mode = ?self.mode, "session initialized");
        self.state = State::Ready;
        Ok(())
    }

    /// Reads the next request from the peer.
    ///
    /// Timestamp records are acknowledged and skipped. End-of-directory
    /// records are acknowledged before they are returned.
    pub fn pull_request(&mut self) -> Result<PullEvent, ScpError> {
        self.expect_mode(ScpMode::Read)?;
        match self.state {
            State::Ready => {}
            State::Drained => return Ok(PullEvent::EndOfStream),
            State::Requested => {
                return Err(ScpError::InvalidState(
                    "previous request was neither accepted nor denied",
                ));
            }
            _ => return Err(ScpError::InvalidState("session is not waiting for a request")),
        }
        let result = self.next_event();
        self.track(result)
    }

    fn next_event(&mut self) -> Result<PullEvent, ScpError> {
        loop {
            let Some(tag) = self.read_byte()? else {
                self.state = State::Drained;
                return Ok(PullEvent::EndOfStream);
            };

            match tag {
                b'C' | b'D' | b'E' | b'T' => {
                    let mut line = vec![tag];
                    line.extend(self.read_line()?);
                    let record = ControlRecord::parse(&line)?;
                    tracing::trace!(target: "scp::proto", ?record, "received control record");
                    match record {
                        ControlRecord::Times { .. } => self.send_ok()?,
                        ControlRecord::EndDirectory => {
                            self.send_ok()?;
                            return Ok(PullEvent::EndOfDirectory);
                        }
                        ControlRecord::File { mode, size, name } => {
                            self.pending = Some(Pending::File {
                                name: name.clone(),
                                size,
                                mode,
                            });
                            self.state = State::Requested;
                            return Ok(PullEvent::NewFile { name, size, mode });
                        }
                        ControlRecord::Directory { mode, name } => {
                            self.pending = Some(Pending::Directory {
                                name: name.clone(),
                                mode,
                            });
                            self.state = State::Requested;
                            return Ok(PullEvent::NewDirectory { name, mode });
                        }
                    }
                }
                RESPONSE_WARNING => {
                    let message = self.read_message()?;
                    return Ok(PullEvent::Warning(message));
                }
                RESPONSE_ERROR => {
                    let message = self.read_message()?;
                    return Err(ScpError::Remote {
                        fatal: true,
                        message,
                    });
                }
                other => {
                    self.state = State::Failed;
                    return Ok(PullEvent::Unexpected(other));
                }
            }
        }
    }

    /// Accepts the pending request so that its payload or children follow.
    pub fn accept_request(&mut self) -> Result<(), ScpError> {
        self.expect_state(State::Requested, "no request is pending")?;
        let result = self.send_ok();
        self.track(result)?;
        self.state = match self.pending {
            Some(Pending::File { size, .. }) => State::ReadingFile { remaining: size },
            _ => State::Ready,
        };
        Ok(())
    }

    /// Refuses the pending request with a warning carrying `reason`.
    pub fn deny_request(&mut self, reason: &str) -> Result<(), ScpError> {
        self.expect_state(State::Requested, "no request is pending")?;
        let result = self.send(&Response::Warning(reason.to_owned()).encode());
        self.track(result)?;
        self.pending = None;
        self.state = State::Ready;
        Ok(())
    }

    /// Name of the pending or accepted request.
    #[must_use]
    pub fn requested_filename(&self) -> Option<&str> {
        match &self.pending {
            Some(Pending::File { name, .. } | Pending::Directory { name, .. }) => Some(name),
            None => None,
        }
    }

    /// Size of the pending or accepted file request.
    #[must_use]
    pub fn requested_size(&self) -> Option<u64> {
        match &self.pending {
            Some(Pending::File { size, .. }) => Some(*size),
            _ => None,
        }
    }

    /// Permission bits of the pending or accepted request.
    #[must_use]
    pub fn requested_permissions(&self) -> Option<u32> {
        match &self.pending {
            Some(Pending::File { mode, .. } | Pending::Directory { mode, .. }) => Some(*mode),
            None => None,
        }
    }

    /// Reads payload of the accepted file into `buf`.
    ///
    /// Returns `Ok(0)` once the whole payload has been consumed; the read
    /// that consumes the last byte also completes the trailing handshake. A
    /// zero-length file therefore finishes with a single call returning 0.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ScpError> {
        let State::ReadingFile { remaining } = self.state else {
            return Err(ScpError::InvalidState("no accepted file to read from"));
        };

        if remaining == 0 {
            let result = self.finish_incoming_file();
            self.track(result)?;
            return Ok(0);
        }
        if buf.is_empty() {
            return Err(ScpError::InvalidState("read buffer is empty"));
        }

        let want = usize::try_from(remaining).map_or(buf.len(), |left| left.min(buf.len()));
        let result = self.read_payload(&mut buf[..want], remaining);
        self.track(result)
    }

    fn read_payload(&mut self, buf: &mut [u8], remaining: u64) -> Result<usize, ScpError> {
        let read = loop {
            match self.reader.read(buf) {
                Ok(read) => break read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        };
        if read == 0 {
            return Err(ScpError::protocol(format!(
                "stream ended with {remaining} payload bytes outstanding"
            )));
        }

        let remaining = remaining - read as u64;
        self.state = State::ReadingFile { remaining };
        if remaining == 0 {
            self.finish_incoming_file()?;
        }
        Ok(read)
    }

    fn finish_incoming_file(&mut self) -> Result<(), ScpError> {
        self.read_response()?;
        self.send_ok()?;
        self.pending = None;
        self.state = State::Ready;
        Ok(())
    }

    /// Announces a regular file. `name` is reduced to its final component.
    ///
    /// A zero-length file is completed immediately; otherwise exactly `size`
    /// bytes must follow through [`write`](Self::write).
    pub fn push_file(&mut self, name: &str, size: u64, mode: u32) -> Result<(), ScpError> {
        self.expect_mode(ScpMode::Write)?;
        self.expect_state(State::Ready, "session is not ready to announce a file")?;
        let name = final_component(name);
        validate_name(name)?;

        let record = ControlRecord::File {
            mode: mode & MODE_MASK,
            size,
            name: name.to_owned(),
        };
        let result = self.announce(&record);
        self.track(result)?;

        if size == 0 {
            let result = self.finish_outgoing_file();
            self.track(result)?;
        } else {
            self.state = State::WritingFile { remaining: size };
        }
        Ok(())
    }

    /// Writes payload of the announced file and returns the bytes written.
    ///
    /// Writing the final byte sends the completion status and waits for the
    /// peer's acknowledgement.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, ScpError> {
        let State::WritingFile { remaining } = self.state else {
            return Err(ScpError::InvalidState("no announced file to write to"));
        };
        if data.len() as u64 > remaining {
            return Err(ScpError::InvalidState(
                "write exceeds the announced file size",
            ));
        }

        let result = self.write_payload(data, remaining);
        self.track(result)?;
        Ok(data.len())
    }

    fn write_payload(&mut self, data: &[u8], remaining: u64) -> Result<(), ScpError> {
        self.writer.write_all(data)?;
        let remaining = remaining - data.len() as u64;
        self.state = State::WritingFile { remaining };
        if remaining == 0 {
            self.finish_outgoing_file()?;
        }
        Ok(())
    }

    fn finish_outgoing_file(&mut self) -> Result<(), ScpError> {
        self.send_ok()?;
        self.state = State::Ready;
        self.read_response()
    }

    /// Announces a directory; following entries are created inside it.
    pub fn push_directory(&mut self, name: &str, mode: u32) -> Result<(), ScpError> {
        self.expect_mode(ScpMode::Write)?;
        self.expect_state(State::Ready, "session is not ready to announce a directory")?;
        let name = final_component(name);
        validate_name(name)?;

        let record = ControlRecord::Directory {
            mode: mode & MODE_MASK,
            name: name.to_owned(),
        };
        let result = self.announce(&record);
        self.track(result)?;
        self.open_directories += 1;
        Ok(())
    }

    /// Closes the innermost announced directory.
    pub fn leave_directory(&mut self) -> Result<(), ScpError> {
        self.expect_mode(ScpMode::Write)?;
        self.expect_state(State::Ready, "session is not ready to leave a directory")?;
        if self.open_directories == 0 {
            return Err(ScpError::InvalidState("no directory is open"));
        }
        let result = self.announce(&ControlRecord::EndDirectory);
        self.track(result)?;
        self.open_directories -= 1;
        Ok(())
    }

    /// Ends the exchange. Further operations fail.
    pub fn close(&mut self) -> Result<(), ScpError> {
        match self.state {
            State::Closed => return Ok(()),
            State::WritingFile { .. } => {
                return Err(ScpError::InvalidState(
                    "announced file payload is incomplete",
                ));
            }
            _ => {}
        }
        if self.mode == ScpMode::Write && self.open_directories > 0 {
            return Err(ScpError::InvalidState("announced directory was never left"));
        }
        self.writer.flush()?;
        self.state = State::Closed;
        tracing::trace!(target: "scp::proto", "session closed");
        Ok(())
    }

    /// Returns the underlying reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner(), self.writer)
    }

    fn announce(&mut self, record: &ControlRecord) -> Result<(), ScpError> {
        tracing::trace!(target: "scp::proto", ?record, "sending control record");
        self.send(&record.encode())?;
        self.read_response()
    }

    fn send_ok(&mut self) -> Result<(), ScpError> {
        self.send(&[RESPONSE_OK])
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), ScpError> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_response(&mut self) -> Result<(), ScpError> {
        let response = match self.read_byte()? {
            None => {
                return Err(ScpError::protocol(
                    "stream ended while waiting for an acknowledgement",
                ));
            }
            Some(RESPONSE_OK) => Response::Ok,
            Some(RESPONSE_WARNING) => Response::Warning(self.read_message()?),
            Some(RESPONSE_ERROR) => Response::Error(self.read_message()?),
            Some(other) => {
                return Err(ScpError::protocol(format!(
                    "unexpected acknowledgement byte 0x{other:02x}"
                )));
            }
        };
        response.into_result()
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ScpError> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn read_message(&mut self) -> Result<String, ScpError> {
        let line = self.read_line()?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ScpError> {
        let mut line = Vec::new();
        loop {
            let (consumed, complete) = {
                let available = self.reader.fill_buf()?;
                if available.is_empty() {
                    return Err(ScpError::protocol("stream ended inside a control line"));
                }
                match memchr(b'\n', available) {
                    Some(index) => {
                        line.extend_from_slice(&available[..index]);
                        (index + 1, true)
                    }
                    None => {
                        line.extend_from_slice(available);
                        (available.len(), false)
                    }
                }
            };
            self.reader.consume(consumed);

            if line.len() >= MAX_CONTROL_LINE {
                return Err(ScpError::protocol("control line exceeds the length limit"));
            }
            if complete {
                return Ok(line);
            }
        }
    }

    fn expect_mode(&self, mode: ScpMode) -> Result<(), ScpError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(ScpError::InvalidState(match mode {
                ScpMode::Read => "operation requires a read-mode session",
                ScpMode::Write => "operation requires a write-mode session",
            }))
        }
    }

    fn expect_state(&self, expected: State, message: &'static str) -> Result<(), ScpError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ScpError::InvalidState(message))
        }
    }

    fn track<T>(&mut self, result: Result<T, ScpError>) -> Result<T, ScpError> {
        if let Err(error) = &result {
            match error {
                ScpError::Remote { fatal: false, .. } => {
                    if matches!(self.state, State::Requested | State::WritingFile { .. }) {
                        self.state = State::Ready;
                    }
                }
                ScpError::InvalidState(_) => {}
                _ => self.state = State::Failed,
            }
        }
        result
    }
}

fn final_component(name: &str) -> &str {
    name.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(name)
}
