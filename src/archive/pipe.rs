//
//  atlas-client
//  archive/pipe.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Bounded in-memory conduit between the archive producer thread and the
//! reader handed to callers.
//!
//! The writer batches bytes into frames of at most [`FRAME_SIZE`] and blocks
//! once [`FRAME_DEPTH`] frames are queued, so at most
//! `FRAME_SIZE * (FRAME_DEPTH + 1)` bytes are ever in flight. Dropping the
//! reader disconnects the channel and every later write fails with
//! `BrokenPipe`, which unwinds the producer.

use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};

use super::ArchiveError;

/// Largest frame handed across the channel.
pub(crate) const FRAME_SIZE: usize = 64 * 1024;

/// Number of frames the channel holds before the writer blocks.
pub(crate) const FRAME_DEPTH: usize = 4;

pub(crate) enum Frame {
    Data(Vec<u8>),
    /// Clean end of stream carrying the total byte count.
    End(u64),
    Failed(ArchiveError),
}

/// Creates a connected writer/reader pair.
pub(crate) fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::sync_channel(FRAME_DEPTH);
    (
        PipeWriter {
            tx,
            buf: Vec::with_capacity(FRAME_SIZE),
            written: 0,
        },
        PipeReader {
            rx,
            buf: Vec::new(),
            pos: 0,
            size: None,
            finished: false,
        },
    )
}

pub(crate) struct PipeWriter {
    tx: SyncSender<Frame>,
    buf: Vec<u8>,
    written: u64,
}

impl PipeWriter {
    /// Returns a sender for reporting a terminal failure out of band.
    pub(crate) fn failure_sender(&self) -> SyncSender<Frame> {
        self.tx.clone()
    }

    /// Flushes buffered bytes and signals a clean end of stream.
    pub(crate) fn finish(mut self) -> io::Result<u64> {
        self.send_buffered()?;
        let total = self.written;
        self.send(Frame::End(total))?;
        Ok(total)
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let frame = std::mem::replace(&mut self.buf, Vec::with_capacity(FRAME_SIZE));
        self.send(Frame::Data(frame))
    }

    fn send(&self, frame: Frame) -> io::Result<()> {
        self.tx
            .send(frame)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive reader closed"))
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let room = FRAME_SIZE - self.buf.len();
        let n = room.min(data.len());
        self.buf.extend_from_slice(&data[..n]);
        self.written += n as u64;

        if self.buf.len() == FRAME_SIZE {
            self.send_buffered()?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

pub(crate) struct PipeReader {
    rx: Receiver<Frame>,
    buf: Vec<u8>,
    pos: usize,
    size: Option<u64>,
    finished: bool,
}

impl PipeReader {
    /// Total stream size, known once the end of stream has been read.
    pub(crate) fn size(&self) -> Option<u64> {
        self.size
    }
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.buf.len() {
                let n = out.len().min(self.buf.len() - self.pos);
                out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }

            if self.finished || out.is_empty() {
                return Ok(0);
            }

            match self.rx.recv() {
                Ok(Frame::Data(data)) => {
                    self.buf = data;
                    self.pos = 0;
                }
                Ok(Frame::End(total)) => {
                    self.size = Some(total);
                    self.finished = true;
                }
                Ok(Frame::Failed(err)) => {
                    self.finished = true;
                    return Err(io::Error::new(io::ErrorKind::Other, err));
                }
                Err(_) => {
                    self.finished = true;
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "archive producer exited without finishing",
                    ));
                }
            }
        }
    }
}
