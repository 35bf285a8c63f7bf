//! The analyzer collaborator contract.
//!
//! Syntax analyzers (highlighters, block parsers) consume a buffer strictly
//! through [`LineRead`], a narrow read-only indexing view: reads are stable
//! and lazy, and nothing about the buffer's mutation API leaks into analyzer
//! code. [`Analyzer`] itself stays minimal so implementations only provide
//! the operations they actually need; operations added later will carry
//! default implementations.

use crate::error::BufferError;
use crate::line_buffer::LineBuffer;
use crate::source::LineSource;

/// Read-only indexed access to a lazily-loaded line sequence.
///
/// The receiver is `&mut` because reading an unloaded index pulls it from
/// the backing source; the content returned for a given index is stable
/// until the buffer is edited.
pub trait LineRead {
    /// Get the line at `index`, including its terminator.
    fn get_line(&mut self, index: usize) -> Result<&str, BufferError>;
}

impl<S: LineSource, A> LineRead for LineBuffer<S, A> {
    fn get_line(&mut self, index: usize) -> Result<&str, BufferError> {
        self.line(index)
    }
}

/// A pluggable analyzer over a line buffer.
pub trait Analyzer {
    /// Find the contiguous run of lines starting at `start_line` that forms
    /// one coherent unit for this analyzer (a highlight block, a parse
    /// unit), reading at most `max_lines` lines.
    ///
    /// What constitutes a unit is entirely analyzer policy; the buffer
    /// guarantees only that indexed reads through `lines` are stable and
    /// lazy.
    fn find_block(
        &mut self,
        lines: &mut dyn LineRead,
        start_line: usize,
        max_lines: usize,
    ) -> Result<Vec<String>, BufferError>;
}
