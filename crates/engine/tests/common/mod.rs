//! In-process scp peer used by the end-to-end tests.
//!
//! The peer plays the part of the remote `scp -f` (source) or `scp -t`
//! (sink) on one end of a Unix socket pair; the engine drives a real
//! `ScpSession` on the other end.

#![allow(dead_code)]

use std::fs;
use std::io::{self, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use engine::{RequestMode, TransferError, Transport};
use scp_io::ScpSession;
use scp_io::protocol::ControlRecord;

pub type PeerSession = ScpSession<UnixStream, UnixStream>;

/// Transport whose requests are served by a thread-hosted peer rooted at a
/// local directory standing in for the remote filesystem.
pub struct PeerTransport {
    peers: Vec<JoinHandle<io::Result<()>>>,
}

impl PeerTransport {
    pub fn new() -> Self {
        Self { peers: Vec::new() }
    }

    /// Waits for every peer thread and returns the first peer failure.
    pub fn finish(self) -> io::Result<()> {
        for peer in self.peers {
            peer.join()
                .map_err(|_| io::Error::other("peer thread panicked"))??;
        }
        Ok(())
    }
}

impl Transport for PeerTransport {
    type Channel = PeerSession;

    fn open_request(
        &mut self,
        mode: RequestMode,
        recursive: bool,
        path: &str,
    ) -> Result<Self::Channel, TransferError> {
        let (local, remote) = UnixStream::pair().map_err(|error| TransferError::Connection {
            target: path.to_owned(),
            reason: error.to_string(),
        })?;
        let writer = local.try_clone().map_err(|error| TransferError::Connection {
            target: path.to_owned(),
            reason: error.to_string(),
        })?;

        let path = PathBuf::from(path);
        let peer = match mode {
            RequestMode::Read => thread::spawn(move || serve_source(remote, &path)),
            RequestMode::Write => thread::spawn(move || serve_sink(remote, &path, recursive)),
        };
        self.peers.push(peer);

        Ok(ScpSession::new(mode, local, writer))
    }
}

fn read_byte(stream: &mut UnixStream) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    match stream.read(&mut byte)? {
        0 => Ok(None),
        _ => Ok(Some(byte[0])),
    }
}

fn read_line(stream: &mut UnixStream) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();
    loop {
        match read_byte(stream)? {
            Some(b'\n') => return Ok(line),
            Some(byte) => line.push(byte),
            None => return Err(io::ErrorKind::UnexpectedEof.into()),
        }
    }
}

fn expect_ack(stream: &mut UnixStream) -> io::Result<()> {
    match read_byte(stream)? {
        Some(0) => Ok(()),
        Some(_) => {
            let message = read_line(stream)?;
            Err(io::Error::other(String::from_utf8_lossy(&message).into_owned()))
        }
        None => Err(io::ErrorKind::UnexpectedEof.into()),
    }
}

fn mode_of(path: &Path) -> io::Result<u32> {
    Ok(fs::metadata(path)?.permissions().mode() & 0o7777)
}

/// Behaves like `scp -f <path>`.
fn serve_source(mut stream: UnixStream, path: &Path) -> io::Result<()> {
    expect_ack(&mut stream)?;
    if !path.exists() {
        let message = format!("\x01scp: {}: No such file or directory\n", path.display());
        stream.write_all(message.as_bytes())?;
        return Ok(());
    }
    send_entry(&mut stream, path)
}

fn send_entry(stream: &mut UnixStream, path: &Path) -> io::Result<()> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mode = mode_of(path)?;

    if path.is_dir() {
        stream.write_all(&ControlRecord::Directory { mode, name }.encode())?;
        expect_ack(stream)?;
        let mut children: Vec<_> = fs::read_dir(path)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<io::Result<_>>()?;
        children.sort();
        for child in children {
            send_entry(stream, &child)?;
        }
        stream.write_all(&ControlRecord::EndDirectory.encode())?;
        expect_ack(stream)
    } else {
        let contents = fs::read(path)?;
        stream.write_all(&ControlRecord::Times { mtime: 0, atime: 0 }.encode())?;
        expect_ack(stream)?;
        let record = ControlRecord::File {
            mode,
            size: contents.len() as u64,
            name,
        };
        stream.write_all(&record.encode())?;
        expect_ack(stream)?;
        stream.write_all(&contents)?;
        stream.write_all(&[0])?;
        expect_ack(stream)
    }
}

/// Behaves like `scp -t [-r] <path>`.
fn serve_sink(mut stream: UnixStream, target: &Path, recursive: bool) -> io::Result<()> {
    stream.write_all(&[0])?;
    let mut stack: Vec<PathBuf> = Vec::new();

    while let Some(tag) = read_byte(&mut stream)? {
        let mut line = vec![tag];
        line.extend(read_line(&mut stream)?);
        let record = ControlRecord::parse(&line).map_err(io::Error::other)?;

        let parent = stack.last().cloned();
        let place = |name: &str| match &parent {
            Some(dir) => dir.join(name),
            None if target.is_dir() => target.join(name),
            None => target.to_path_buf(),
        };

        match record {
            ControlRecord::Times { .. } => stream.write_all(&[0])?,
            ControlRecord::Directory { mode, name } => {
                if !recursive {
                    stream.write_all(b"\x02scp: received directory without -r\n")?;
                    return Err(io::Error::other("directory without -r"));
                }
                let dir = place(&name);
                fs::create_dir_all(&dir)?;
                fs::set_permissions(&dir, fs::Permissions::from_mode(mode))?;
                stack.push(dir);
                stream.write_all(&[0])?;
            }
            ControlRecord::EndDirectory => {
                stack.pop();
                stream.write_all(&[0])?;
            }
            ControlRecord::File { mode, size, name } => {
                let file = place(&name);
                stream.write_all(&[0])?;
                let mut contents = vec![0u8; size as usize];
                stream.read_exact(&mut contents)?;
                if read_byte(&mut stream)? != Some(0) {
                    return Err(io::Error::other("missing payload status"));
                }
                fs::write(&file, &contents)?;
                fs::set_permissions(&file, fs::Permissions::from_mode(mode))?;
                stream.write_all(&[0])?;
            }
        }
    }
    Ok(())
}
