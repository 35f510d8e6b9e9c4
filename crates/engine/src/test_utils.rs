//! Scripted channel shared by the engine unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::{RequestMode, TransferChannel, TransferError, TransferRequest, Transport};

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Call {
    Init,
    Accept,
    Read(usize),
    PushFile { name: String, size: u64, mode: u32 },
    Write(Vec<u8>),
    PushDirectory { name: String, mode: u32 },
    LeaveDirectory,
    Close,
}

/// Replays a fixed list of requests and records every call the engine makes.
#[derive(Default)]
pub(crate) struct ScriptedChannel {
    requests: VecDeque<TransferRequest>,
    payloads: VecDeque<Vec<u8>>,
    pending_file: bool,
    current: Option<VecDeque<u8>>,
    chunk_limit: Option<usize>,
    fail_push_file: Option<String>,
    failure: Option<TransferError>,
    pub(crate) calls: Vec<Call>,
}

impl ScriptedChannel {
    pub(crate) fn new(requests: impl IntoIterator<Item = TransferRequest>) -> Self {
        Self {
            requests: requests.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Payloads handed out, in order, to accepted `NewFile` requests.
    pub(crate) fn with_payloads(mut self, payloads: impl IntoIterator<Item = Vec<u8>>) -> Self {
        self.payloads = payloads.into_iter().collect();
        self
    }

    /// Caps every read at `limit` bytes.
    pub(crate) fn with_chunk_limit(mut self, limit: usize) -> Self {
        self.chunk_limit = Some(limit);
        self
    }

    /// Makes `push_file` fail with a remote error for `name`.
    pub(crate) fn failing_push_of(mut self, name: &str) -> Self {
        self.fail_push_file = Some(name.to_owned());
        self
    }

    /// Keeps `failure` for [`TransferChannel::take_failure`].
    pub(crate) fn with_failure(mut self, failure: TransferError) -> Self {
        self.failure = Some(failure);
        self
    }

    pub(crate) fn read_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Read(_)))
            .count()
    }
}

impl TransferChannel for ScriptedChannel {
    fn init(&mut self) -> Result<(), TransferError> {
        self.calls.push(Call::Init);
        Ok(())
    }

    fn pull_request(&mut self) -> TransferRequest {
        let request = self
            .requests
            .pop_front()
            .unwrap_or(TransferRequest::EndOfStream);
        self.pending_file = matches!(request, TransferRequest::NewFile { .. });
        request
    }

    fn take_failure(&mut self) -> Option<TransferError> {
        self.failure.take()
    }

    fn accept_request(&mut self) -> Result<(), TransferError> {
        self.calls.push(Call::Accept);
        if self.pending_file {
            let payload = self.payloads.pop_front().unwrap_or_default();
            self.current = Some(payload.into());
            self.pending_file = false;
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransferError> {
        let Some(current) = self.current.as_mut() else {
            return Err(TransferError::protocol("read without an accepted file"));
        };
        let limit = self.chunk_limit.unwrap_or(usize::MAX).min(buf.len());
        let count = current.len().min(limit);
        for (slot, byte) in buf.iter_mut().zip(current.drain(..count)) {
            *slot = byte;
        }
        if current.is_empty() && count == 0 {
            self.current = None;
        }
        self.calls.push(Call::Read(count));
        Ok(count)
    }

    fn push_file(&mut self, name: &str, size: u64, mode: u32) -> Result<(), TransferError> {
        self.calls.push(Call::PushFile {
            name: name.to_owned(),
            size,
            mode,
        });
        if self.fail_push_file.as_deref() == Some(name) {
            return Err(TransferError::Remote {
                message: format!("scp: {name}: Permission denied"),
            });
        }
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransferError> {
        self.calls.push(Call::Write(data.to_vec()));
        Ok(data.len())
    }

    fn push_directory(&mut self, name: &str, mode: u32) -> Result<(), TransferError> {
        self.calls.push(Call::PushDirectory {
            name: name.to_owned(),
            mode,
        });
        Ok(())
    }

    fn leave_directory(&mut self) -> Result<(), TransferError> {
        self.calls.push(Call::LeaveDirectory);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransferError> {
        self.calls.push(Call::Close);
        Ok(())
    }
}

/// Channel handle that lets a test inspect the script after the transfer.
#[derive(Clone)]
pub(crate) struct SharedChannel(pub(crate) Rc<RefCell<ScriptedChannel>>);

impl TransferChannel for SharedChannel {
    fn init(&mut self) -> Result<(), TransferError> {
        self.0.borrow_mut().init()
    }

    fn pull_request(&mut self) -> TransferRequest {
        self.0.borrow_mut().pull_request()
    }

    fn take_failure(&mut self) -> Option<TransferError> {
        self.0.borrow_mut().take_failure()
    }

    fn accept_request(&mut self) -> Result<(), TransferError> {
        self.0.borrow_mut().accept_request()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransferError> {
        self.0.borrow_mut().read(buf)
    }

    fn push_file(&mut self, name: &str, size: u64, mode: u32) -> Result<(), TransferError> {
        self.0.borrow_mut().push_file(name, size, mode)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransferError> {
        self.0.borrow_mut().write(data)
    }

    fn push_directory(&mut self, name: &str, mode: u32) -> Result<(), TransferError> {
        self.0.borrow_mut().push_directory(name, mode)
    }

    fn leave_directory(&mut self) -> Result<(), TransferError> {
        self.0.borrow_mut().leave_directory()
    }

    fn close(&mut self) -> Result<(), TransferError> {
        self.0.borrow_mut().close()
    }
}

/// Transport that hands out one scripted channel and records the request.
pub(crate) struct ScriptedTransport {
    pub(crate) channel: Rc<RefCell<ScriptedChannel>>,
    pub(crate) opened: Vec<(RequestMode, bool, String)>,
}

impl ScriptedTransport {
    pub(crate) fn new(channel: ScriptedChannel) -> Self {
        Self {
            channel: Rc::new(RefCell::new(channel)),
            opened: Vec::new(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.channel.borrow().calls.clone()
    }
}

impl Transport for ScriptedTransport {
    type Channel = SharedChannel;

    fn open_request(
        &mut self,
        mode: RequestMode,
        recursive: bool,
        path: &str,
    ) -> Result<Self::Channel, TransferError> {
        self.opened.push((mode, recursive, path.to_owned()));
        Ok(SharedChannel(Rc::clone(&self.channel)))
    }
}
