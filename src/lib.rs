//! lazylines: a lazy, line-oriented text buffer for editors.
//!
//! A [`LineBuffer`] presents a file as an indexed sequence of lines without
//! reading it upfront: lines are pulled from a sequential [`LineSource`] the
//! first time an index is touched and cached from then on. On top of indexed
//! access it provides the character-level editing primitives an editor needs
//! (range deletion, multi-line insertion, line splitting and merging), while
//! preserving the file's bytes exactly, including mixed `\n` / `\r\n` /
//! `\r` line endings.
//!
//! [`BufferSession`] wraps the open/save lifecycle around a file on disk,
//! and the [`analysis`] module defines the narrow read-only contract through
//! which syntax analyzers consume a buffer.
//!
//! ```
//! use lazylines::{LineBuffer, Position, StringSource};
//!
//! let mut buffer: LineBuffer<StringSource> =
//!     LineBuffer::new(StringSource::from_text("fn main() {\n    body\n}\n"));
//!
//! assert_eq!(buffer.line(1)?, "    body\n");
//! // Only lines 0 and 1 have been read so far
//! assert_eq!(buffer.loaded_count(), 2);
//!
//! let removed = buffer.delete_range(Position::new(1, 4), Position::new(1, 8))?;
//! assert_eq!(removed, "body");
//! assert_eq!(buffer.line(1)?, "    \n");
//! # Ok::<(), lazylines::BufferError>(())
//! ```

pub mod analysis;
pub mod error;
pub mod line_buffer;
pub mod line_ending;
pub mod session;
pub mod source;

pub use analysis::{Analyzer, LineRead};
pub use error::BufferError;
pub use line_buffer::{LineBuffer, Position};
pub use line_ending::LineEnding;
pub use session::BufferSession;
pub use source::{FileSource, LineSource, ReaderSource, StringSource};
