//! File-backed buffer sessions.
//!
//! A [`BufferSession`] owns the open/save lifecycle around a [`LineBuffer`]:
//! it opens a file for lazy sequential reading, detects the file's
//! line-ending style so synthesized terminators match, and on save forces a
//! full load before rewriting the destination. The file handle is released
//! when the session is dropped, however the session ends.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::line_buffer::LineBuffer;
use crate::line_ending::LineEnding;
use crate::source::{FileSource, ReaderSource};

/// Bytes sampled from the head of a file for line-ending detection
const DETECT_SAMPLE_SIZE: u64 = 8 * 1024;

/// An editing session over one file.
///
/// `A` is the per-line annotation type of the underlying buffer; it defaults
/// to `()` when annotations are unused.
pub struct BufferSession<A = ()> {
    path: PathBuf,
    buffer: LineBuffer<FileSource, A>,
}

impl<A> BufferSession<A> {
    /// Open `path` and bind a lazy [`LineBuffer`] to it.
    ///
    /// No line is read until the buffer is first indexed; only a head sample
    /// is taken here to detect the file's line-ending style.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file =
            File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;

        let mut sample = Vec::new();
        (&mut file)
            .take(DETECT_SAMPLE_SIZE)
            .read_to_end(&mut sample)
            .with_context(|| format!("failed to read {}", path.display()))?;
        file.seek(SeekFrom::Start(0))?;
        let line_ending = LineEnding::detect(&sample);

        tracing::debug!(
            "BufferSession::open: {} ({:?} line endings)",
            path.display(),
            line_ending
        );

        let source = ReaderSource::new(BufReader::new(file));
        Ok(Self {
            path,
            buffer: LineBuffer::with_line_ending(source, line_ending),
        })
    }

    /// The path this session reads from and saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffer(&self) -> &LineBuffer<FileSource, A> {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut LineBuffer<FileSource, A> {
        &mut self.buffer
    }

    /// Write the buffer back to its file, replacing the previous content.
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone();
        self.save_to(path)
    }

    /// Write the buffer to `path`, replacing that file's content entirely.
    ///
    /// Forces a full load first: the destination may be the file the buffer
    /// is still lazily reading from, and truncating it with unread content
    /// left in it would destroy that content.
    pub fn save_to<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.buffer.load_all()?;

        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for line in self.buffer.iter_loaded() {
            writer.write_all(line.as_bytes())?;
        }
        writer.flush()?;

        tracing::debug!(
            "BufferSession::save: wrote {} lines to {}",
            self.buffer.loaded_count(),
            path.display()
        );
        Ok(())
    }
}
