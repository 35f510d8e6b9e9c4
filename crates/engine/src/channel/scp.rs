use std::io::{Read, Write};

use scp_io::{PullEvent, ScpError, ScpSession};

use super::TransferChannel;
use crate::{TransferError, TransferRequest};

impl From<ScpError> for TransferError {
    fn from(error: ScpError) -> Self {
        match error {
            ScpError::Io(source) => Self::Stream { source },
            ScpError::Remote { message, .. } => Self::Remote { message },
            ScpError::Protocol(message) => Self::ProtocolViolation(message),
            ScpError::InvalidState(message) => Self::ProtocolViolation(message.to_owned()),
        }
    }
}

impl From<PullEvent> for TransferRequest {
    fn from(event: PullEvent) -> Self {
        match event {
            PullEvent::NewFile { name, size, mode } => Self::NewFile { name, size, mode },
            PullEvent::NewDirectory { name, mode } => Self::NewDirectory { name, mode },
            PullEvent::EndOfDirectory => Self::EndOfDirectory,
            PullEvent::Warning(message) => Self::Warning { message },
            PullEvent::EndOfStream => Self::EndOfStream,
            PullEvent::Unexpected(raw_code) => Self::Unexpected { raw_code },
        }
    }
}

impl<R: Read, W: Write> TransferChannel for ScpSession<R, W> {
    fn init(&mut self) -> Result<(), TransferError> {
        Ok(Self::init(self)?)
    }

    fn pull_request(&mut self) -> TransferRequest {
        match Self::pull_request(self) {
            Ok(event) => event.into(),
            Err(error) => TransferRequest::ProtocolError {
                message: error.to_string(),
            },
        }
    }

    fn accept_request(&mut self) -> Result<(), TransferError> {
        Ok(Self::accept_request(self)?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransferError> {
        Ok(Self::read(self, buf)?)
    }

    fn push_file(&mut self, name: &str, size: u64, mode: u32) -> Result<(), TransferError> {
        Ok(Self::push_file(self, name, size, mode)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransferError> {
        Ok(Self::write(self, data)?)
    }

    fn push_directory(&mut self, name: &str, mode: u32) -> Result<(), TransferError> {
        Ok(Self::push_directory(self, name, mode)?)
    }

    fn leave_directory(&mut self) -> Result<(), TransferError> {
        Ok(Self::leave_directory(self)?)
    }

    fn close(&mut self) -> Result<(), TransferError> {
        Ok(Self::close(self)?)
    }
}
