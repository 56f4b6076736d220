//! Zip output for fetched files.
//!
//! Archives are written with a non-seeking zip writer, so they can be
//! produced front to back into any sink. [`archive_stream`] runs the writer
//! on a blocking task and hands out the bytes as they are produced.

use std::io::{self, Write};

use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{
    error::Result,
    types::{FetchOutcome, FetchedFile},
};

/// Size of the chunks pushed to the stream consumer
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the writer task and the consumer
const CHANNEL_CAPACITY: usize = 8;

/// A named file inside an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub content: Bytes,
}

/// Archive entry name for a file of a directory download
///
/// The path relative to `from_path`, or the full repository path when no
/// prefix is given.
pub fn entry_name(file: &FetchedFile, from_path: Option<&str>) -> String {
    match from_path {
        Some(from) => relative_path(from, &file.path),
        None => file.path.clone(),
    }
}

/// Slash-separated path leading from `from` to `to`
pub fn relative_path(from: &str, to: &str) -> String {
    let from: Vec<&str> = components(from).collect();
    let to: Vec<&str> = components(to).collect();

    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    std::iter::repeat("..")
        .take(from.len() - common)
        .chain(to[common..].iter().copied())
        .collect::<Vec<_>>()
        .join("/")
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty() && *c != ".")
}

pub fn entries_for_directory(files: &[FetchedFile], from_path: Option<&str>) -> Vec<ArchiveEntry> {
    files
        .iter()
        .map(|file| ArchiveEntry {
            name: entry_name(file, from_path),
            content: file.content.clone(),
        })
        .collect()
}

/// A lone file is stored under its own name, not its repository path
pub fn entry_for_file(file: &FetchedFile) -> ArchiveEntry {
    ArchiveEntry {
        name: file.name.clone(),
        content: file.content.clone(),
    }
}

pub fn entries_for_outcome(outcome: &FetchOutcome, from_path: Option<&str>) -> Vec<ArchiveEntry> {
    match outcome {
        FetchOutcome::File(file) => vec![entry_for_file(file)],
        FetchOutcome::Directory(files) => entries_for_directory(files, from_path),
    }
}

fn file_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Write a zip archive of `entries` into `writer`
///
/// The writer is only ever appended to.
pub fn write_archive<W: Write>(entries: &[ArchiveEntry], writer: W) -> Result<()> {
    let mut zip = ZipWriter::new_stream(writer);

    for entry in entries {
        zip.start_file(entry.name.as_str(), file_options())?;
        zip.write_all(&entry.content)?;
    }

    zip.finish()?;
    Ok(())
}

/// Forwards written bytes to an async consumer in fixed-size chunks
struct ChannelWriter {
    sender: mpsc::Sender<io::Result<Bytes>>,
    buffer: Vec<u8>,
}

impl ChannelWriter {
    fn send_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = Bytes::from(std::mem::replace(
            &mut self.buffer,
            Vec::with_capacity(CHUNK_SIZE),
        ));
        self.sender
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive consumer went away"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= CHUNK_SIZE {
            self.send_buffer()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffer()
    }
}

/// Produce a zip archive of `entries` as a stream of byte chunks
///
/// Must be called from within a tokio runtime. A failure while writing is
/// delivered as the last item of the stream.
pub fn archive_stream(
    entries: Vec<ArchiveEntry>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);

    tokio::task::spawn_blocking(move || {
        let mut writer = ChannelWriter {
            sender: sender.clone(),
            buffer: Vec::with_capacity(CHUNK_SIZE),
        };

        let written = write_archive(&entries, &mut writer)
            .and_then(|()| writer.flush().map_err(Into::into));

        match written {
            Ok(()) => tracing::debug!(entries = entries.len(), "Archive written"),
            Err(error) => {
                tracing::warn!(%error, "Failed to write archive");
                let _ = sender.blocking_send(Err(io::Error::new(
                    io::ErrorKind::Other,
                    error.to_string(),
                )));
            }
        }
    });

    futures::stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|item| (item, receiver))
    })
}
