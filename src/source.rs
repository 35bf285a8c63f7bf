//! Sequential line sources backing a buffer.
//!
//! A [`LineSource`] hands out one line at a time, terminator included, and is
//! read forward-only apart from the rewind / seek-to-end operations the
//! buffer lifecycle needs. [`ReaderSource`] implements the contract for any
//! buffered seekable reader; [`FileSource`] and [`StringSource`] are the two
//! instantiations used in practice.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Seek, SeekFrom};
use std::path::Path;

/// A sequential source of line-terminated text.
pub trait LineSource {
    /// Read the next line, including its terminator (`\n`, `\r\n`, or `\r`).
    ///
    /// The final line of the input may have no terminator. Returns `None`
    /// once the source is exhausted.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Reset the read position to the start of the source.
    fn rewind(&mut self) -> io::Result<()>;

    /// Move the read position to the end of the source, so that further
    /// reads see no content.
    fn seek_to_end(&mut self) -> io::Result<()>;
}

/// A [`LineSource`] over any buffered seekable reader.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead + Seek> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

/// A line source reading from a file on disk.
pub type FileSource = ReaderSource<BufReader<File>>;

impl ReaderSource<BufReader<File>> {
    /// Open a file for sequential line reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

/// A line source over in-memory text, for scratch buffers and tests.
pub type StringSource = ReaderSource<Cursor<Vec<u8>>>;

impl ReaderSource<Cursor<Vec<u8>>> {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(Cursor::new(text.into().into_bytes()))
    }
}

impl<R: BufRead + Seek> LineSource for ReaderSource<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut raw: Vec<u8> = Vec::new();
        // A CR at the end of a refill may be the first half of a CRLF pair;
        // we have to peek at the next refill before the line is complete.
        let mut pending_cr = false;

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                // End of input. A pending CR was a complete terminator.
                break;
            }
            if pending_cr {
                if buf[0] == b'\n' {
                    raw.push(b'\n');
                    self.reader.consume(1);
                }
                break;
            }
            match buf.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(pos) => {
                    let is_cr = buf[pos] == b'\r';
                    raw.extend_from_slice(&buf[..=pos]);
                    self.reader.consume(pos + 1);
                    if !is_cr {
                        break;
                    }
                    pending_cr = true;
                }
                None => {
                    raw.extend_from_slice(buf);
                    let len = buf.len();
                    self.reader.consume(len);
                }
            }
        }

        if raw.is_empty() {
            return Ok(None);
        }
        // Terminator bytes are ASCII, so a line split on them is valid UTF-8
        // exactly when the input is.
        String::from_utf8(raw)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn seek_to_end(&mut self) -> io::Result<()> {
        self.reader.seek(SeekFrom::End(0))?;
        Ok(())
    }
}
