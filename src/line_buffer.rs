//! The lazy line buffer at the heart of the crate.
//!
//! A [`LineBuffer`] looks like an indexed sequence of lines but is backed by
//! a sequential [`LineSource`]: lines are pulled from the source the first
//! time an index is touched and cached from then on. Editing primitives
//! (range deletion, line split/merge, multi-line insertion) operate on the
//! cached lines, so a buffer over a large file only ever pays for the prefix
//! the editor actually visits.
//!
//! Lines are stored *with* their terminators, and the buffer never rewrites
//! a terminator it did not synthesize itself: a fully loaded, unedited buffer
//! writes back byte-for-byte identical content, whatever mix of `\n`, `\r\n`,
//! and `\r` the file uses.

use crate::error::BufferError;
use crate::line_ending::{ends_with_terminator, split_terminated, strip_terminator, LineEnding};
use crate::source::LineSource;

/// A position within a buffer.
///
/// `column` counts characters (Unicode scalar values), not bytes; the buffer
/// assumes UTF-8 content throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// One realized line and its annotation slot.
///
/// Keeping both in a single struct makes the line/annotation pairing an
/// invariant of the representation instead of a convention between two
/// containers.
#[derive(Debug)]
struct LoadedLine<A> {
    /// The line text, including its trailing terminator (the logically-last
    /// line of the document may have none).
    text: String,
    /// Consumer-stashed derived data (e.g. syntax tokens); any write to the
    /// line resets this to `None`.
    annotation: Option<A>,
}

impl<A> LoadedLine<A> {
    fn new(text: String) -> Self {
        Self { text, annotation: None }
    }

    fn empty() -> Self {
        Self::new(String::new())
    }
}

/// A growable, lazily-populated sequence of text lines backed by a
/// sequential source.
///
/// `S` is the backing [`LineSource`]; `A` is the per-line annotation type
/// consumers such as analyzers may stash alongside each line (defaults to
/// `()` when annotations are unused).
///
/// All realizing operations take `&mut self`: pulling a line moves the
/// source's read cursor and grows the cache, so shared concurrent access is
/// unrepresentable by construction. One buffer belongs to one thread.
pub struct LineBuffer<S, A = ()> {
    source: S,
    lines: Vec<LoadedLine<A>>,
    /// Set when the source first reports end of input. End-of-input
    /// normalization runs on the transition, so it happens at most once per
    /// load cycle; `clear` and `reload` start a new cycle.
    exhausted: bool,
    line_ending: LineEnding,
}

impl<S: LineSource, A> LineBuffer<S, A> {
    /// Create a buffer over `source` with LF as the synthesized terminator.
    pub fn new(source: S) -> Self {
        Self::with_line_ending(source, LineEnding::default())
    }

    /// Create a buffer over `source` with an explicit synthesized-terminator
    /// style.
    pub fn with_line_ending(source: S, line_ending: LineEnding) -> Self {
        Self {
            source,
            lines: Vec::new(),
            exhausted: false,
            line_ending,
        }
    }

    /// The terminator style synthesized when a line must gain one.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    // ---- Lazy access ----

    /// Get the line at `index`, including its terminator.
    ///
    /// Pulls lines from the source one at a time until `index` is loaded or
    /// the source is exhausted. Reading past the end of the document fails
    /// with [`BufferError::OutOfRange`]; it never fabricates content.
    pub fn line(&mut self, index: usize) -> Result<&str, BufferError> {
        self.load_to(index)?;
        match self.lines.get(index) {
            Some(line) => Ok(&line.text),
            None => Err(BufferError::OutOfRange {
                index,
                loaded: self.lines.len(),
            }),
        }
    }

    /// Pull the remaining source to exhaustion, realizing the whole document.
    pub fn load_all(&mut self) -> Result<(), BufferError> {
        while !self.exhausted {
            self.pull()?;
        }
        Ok(())
    }

    /// The last line of the document. Forces a full load.
    pub fn last_line(&mut self) -> Result<&str, BufferError> {
        self.load_all()?;
        match self.lines.last() {
            Some(line) => Ok(&line.text),
            // A fully loaded buffer always holds at least one line (an empty
            // source normalizes to a single empty line).
            None => Err(BufferError::OutOfRange { index: 0, loaded: 0 }),
        }
    }

    /// Total number of lines. Intentionally eager: forces a full load.
    pub fn line_count(&mut self) -> Result<usize, BufferError> {
        self.load_all()?;
        Ok(self.lines.len())
    }

    /// Number of lines loaded so far; never touches the source.
    pub fn loaded_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether the source has been read to exhaustion.
    pub fn is_fully_loaded(&self) -> bool {
        self.exhausted
    }

    /// Iterate over the loaded lines, terminators included.
    pub fn iter_loaded(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    // ---- Indexed writes ----

    /// Overwrite the line at `index` and invalidate its annotation.
    ///
    /// The line must already be loaded; callers that may be writing beyond
    /// the loaded prefix read it first.
    pub fn set_line(&mut self, index: usize, text: impl Into<String>) -> Result<(), BufferError> {
        let loaded = self.lines.len();
        match self.lines.get_mut(index) {
            Some(line) => {
                line.text = text.into();
                line.annotation = None;
                Ok(())
            }
            None => Err(BufferError::OutOfRange { index, loaded }),
        }
    }

    /// Insert a line before `index`, shifting subsequent lines down.
    ///
    /// Loads up to `index` first so the insertion point exists. A non-empty
    /// value without a terminator gains the buffer's line ending, keeping
    /// every line but the last properly terminated.
    pub fn insert_line(&mut self, index: usize, text: impl Into<String>) -> Result<(), BufferError> {
        self.line(index)?;
        let mut text = text.into();
        if !text.is_empty() && !ends_with_terminator(&text) {
            text.push_str(self.line_ending.as_str());
        }
        self.lines.insert(index, LoadedLine::new(text));
        Ok(())
    }

    /// Append a line after the end of the document. Forces a full load.
    ///
    /// Only the true last line may lack a terminator, so the current tail is
    /// terminator-fixed first; `text` itself is appended verbatim.
    pub fn append_line(&mut self, text: impl Into<String>) -> Result<(), BufferError> {
        self.load_all()?;
        self.fix_tail_terminator();
        self.lines.push(LoadedLine::new(text.into()));
        Ok(())
    }

    /// Append each of `values` in order. Forces a full load; the pre-existing
    /// tail is terminator-fixed once, the values are appended verbatim.
    pub fn extend_lines<I>(&mut self, values: I) -> Result<(), BufferError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.load_all()?;
        self.fix_tail_terminator();
        for value in values {
            self.lines.push(LoadedLine::new(value.into()));
        }
        Ok(())
    }

    /// Remove and return the line at `index`. The line must already be
    /// loaded.
    pub fn remove_line(&mut self, index: usize) -> Result<String, BufferError> {
        if index >= self.lines.len() {
            return Err(BufferError::OutOfRange {
                index,
                loaded: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index).text)
    }

    /// Drop all loaded lines and position the source at its end, so further
    /// reads see no content. A destructive reset used when the buffer is
    /// about to be rewritten rather than edited.
    pub fn clear(&mut self) -> Result<(), BufferError> {
        self.source.seek_to_end()?;
        tracing::debug!("LineBuffer::clear: dropping {} loaded lines", self.lines.len());
        self.lines.clear();
        self.exhausted = false;
        Ok(())
    }

    /// Drop all loaded lines and rewind the source, so the document reloads
    /// from the start on next access. Reverts any in-memory edits.
    pub fn reload(&mut self) -> Result<(), BufferError> {
        self.source.rewind()?;
        tracing::debug!("LineBuffer::reload: dropping {} loaded lines", self.lines.len());
        self.lines.clear();
        self.exhausted = false;
        Ok(())
    }

    // ---- Annotations ----

    /// The annotation stashed on a line, if the line is loaded and has one.
    pub fn annotation(&self, index: usize) -> Option<&A> {
        self.lines.get(index).and_then(|line| line.annotation.as_ref())
    }

    /// Stash an annotation on a loaded line.
    pub fn set_annotation(&mut self, index: usize, value: A) -> Result<(), BufferError> {
        let loaded = self.lines.len();
        match self.lines.get_mut(index) {
            Some(line) => {
                line.annotation = Some(value);
                Ok(())
            }
            None => Err(BufferError::OutOfRange { index, loaded }),
        }
    }

    // ---- Editing primitives ----

    /// Delete all text from `start` (inclusive) to `end` (exclusive),
    /// returning the removed text in original document order.
    ///
    /// Columns beyond a line's end clamp to it, matching ordinary selection
    /// semantics; a range whose end precedes its start is rejected before
    /// any mutation.
    pub fn delete_range(&mut self, start: Position, end: Position) -> Result<String, BufferError> {
        if end < start {
            return Err(BufferError::InvalidPosition {
                line: end.line,
                column: end.column,
            });
        }
        // Realizes every affected line; nothing below can fail.
        self.line(end.line)?;

        if start.line == end.line {
            let text = &self.lines[start.line].text;
            let from = byte_index(text, start.column);
            let to = byte_index(text, end.column);
            let removed = text[from..to].to_string();
            let mut kept = String::with_capacity(text.len() - removed.len());
            kept.push_str(&text[..from]);
            kept.push_str(&text[to..]);
            self.set_line(start.line, kept)?;
            return Ok(removed);
        }

        let first = &self.lines[start.line].text;
        let from = byte_index(first, start.column);
        let prefix = first[..from].to_string();
        let mut removed = first[from..].to_string();
        for line in &self.lines[start.line + 1..end.line] {
            removed.push_str(&line.text);
        }
        let last = &self.lines[end.line].text;
        let to = byte_index(last, end.column);
        removed.push_str(&last[..to]);
        let suffix = last[to..].to_string();

        self.lines.drain(start.line + 1..=end.line);
        let mut kept = prefix;
        kept.push_str(&suffix);
        self.set_line(start.line, kept)?;
        Ok(removed)
    }

    /// Break `line` at `column`: the text from `column` onward becomes the
    /// following line, and `line` keeps its prefix with `terminator`
    /// appended. Models pressing Enter mid-line.
    pub fn split_line(
        &mut self,
        line: usize,
        column: usize,
        terminator: &str,
    ) -> Result<(), BufferError> {
        let (head, tail) = {
            let text = self.line(line)?;
            let at = byte_index(text, column);
            (text[..at].to_string(), text[at..].to_string())
        };
        // Insert after `line`, or append when `line` is the last line of the
        // document.
        match self.line(line + 1) {
            Ok(_) => self.insert_line(line + 1, tail)?,
            Err(BufferError::OutOfRange { .. }) => self.append_line(tail)?,
            Err(e) => return Err(e),
        }
        let mut head = head;
        head.push_str(terminator);
        self.set_line(line, head)
    }

    /// Join lines `first..=last` into one: the terminators of `first..last`
    /// are stripped, their content is prepended to line `last`, and the now
    /// redundant lines are removed. `first >= last` is a no-op. Models
    /// deleting a newline.
    pub fn merge_lines(&mut self, first: usize, last: usize) -> Result<(), BufferError> {
        if first >= last {
            return Ok(());
        }
        self.line(last)?;

        let mut merged = String::new();
        for line in &self.lines[first..last] {
            merged.push_str(strip_terminator(&line.text));
        }
        merged.push_str(&self.lines[last].text);
        self.set_line(last, merged)?;
        self.lines.drain(first..last);
        Ok(())
    }

    /// Insert `text` at `pos`, splitting it into new lines at its terminator
    /// boundaries. Each terminator in `text` is preserved verbatim (`\r\n`
    /// is one break, never two).
    ///
    /// Fails with [`BufferError::InvalidPosition`] if `pos.line` is beyond
    /// the document or `pos.column` is past the line's content (excluding
    /// its terminator). Validation completes before any mutation.
    pub fn insert_at_position(&mut self, pos: Position, text: &str) -> Result<(), BufferError> {
        let content_len = match self.line(pos.line) {
            Ok(line) => strip_terminator(line).chars().count(),
            Err(BufferError::OutOfRange { .. }) => {
                return Err(BufferError::InvalidPosition {
                    line: pos.line,
                    column: pos.column,
                })
            }
            Err(e) => return Err(e),
        };
        if pos.column > content_len {
            return Err(BufferError::InvalidPosition {
                line: pos.line,
                column: pos.column,
            });
        }
        if text.is_empty() {
            return Ok(());
        }

        let segments = split_terminated(text);
        let Some((&last_segment, _)) = segments.split_last() else {
            return Ok(());
        };

        if segments.len() == 1 && !ends_with_terminator(last_segment) {
            // No line break in the text: splice it straight into the line.
            let current = &self.lines[pos.line].text;
            let at = byte_index(current, pos.column);
            let mut spliced = String::with_capacity(current.len() + text.len());
            spliced.push_str(&current[..at]);
            spliced.push_str(text);
            spliced.push_str(&current[at..]);
            return self.set_line(pos.line, spliced);
        }

        // Break the target line at the insertion point. The suffix becomes
        // the following line and keeps the line's original terminator; the
        // first segment (terminator included) goes onto the truncated head.
        self.split_line(pos.line, pos.column, "")?;
        let mut head = String::new();
        head.push_str(&self.lines[pos.line].text);
        head.push_str(segments[0]);
        self.set_line(pos.line, head)?;

        let (middle, unterminated_tail) = if ends_with_terminator(last_segment) {
            (&segments[1..], None)
        } else {
            (&segments[1..segments.len() - 1], Some(last_segment))
        };

        let mut next = pos.line + 1;
        for segment in middle {
            self.insert_line(next, *segment)?;
            next += 1;
        }
        if let Some(tail) = unterminated_tail {
            // The final segment has no terminator, so it joins the suffix
            // line rather than standing on its own.
            let mut merged = String::with_capacity(tail.len() + self.lines[next].text.len());
            merged.push_str(tail);
            merged.push_str(&self.lines[next].text);
            self.set_line(next, merged)?;
        }
        Ok(())
    }

    // ---- Internal ----

    /// Pull lines until `index` is loaded or the source runs out.
    fn load_to(&mut self, index: usize) -> Result<(), BufferError> {
        while !self.exhausted && index >= self.lines.len() {
            self.pull()?;
        }
        Ok(())
    }

    /// Pull one line from the source; on end of input, mark the buffer
    /// exhausted and normalize the tail.
    fn pull(&mut self) -> Result<(), BufferError> {
        match self.source.read_line()? {
            Some(text) => self.lines.push(LoadedLine::new(text)),
            None => {
                self.exhausted = true;
                self.normalize_end_of_input();
                tracing::trace!(
                    "LineBuffer: source exhausted after {} lines",
                    self.lines.len()
                );
            }
        }
        Ok(())
    }

    /// End-of-input normalization: content ending in a terminator gets one
    /// empty line after it (the cursor slot after the trailing newline), and
    /// an empty document becomes a single empty line.
    fn normalize_end_of_input(&mut self) {
        match self.lines.last() {
            Some(last) if !last.text.is_empty() && ends_with_terminator(&last.text) => {
                self.lines.push(LoadedLine::empty());
            }
            Some(_) => {}
            None => self.lines.push(LoadedLine::empty()),
        }
    }

    /// Give the current tail a terminator if it is non-empty and lacks one.
    /// An empty tail needs no fix. This rewrites the line, so its annotation
    /// is invalidated.
    fn fix_tail_terminator(&mut self) {
        let style = self.line_ending.as_str();
        if let Some(last) = self.lines.last_mut() {
            if !last.text.is_empty() && !ends_with_terminator(&last.text) {
                last.text.push_str(style);
                last.annotation = None;
            }
        }
    }
}

/// Byte offset of the `column`-th character of `s`, clamped to the end.
fn byte_index(s: &str, column: usize) -> usize {
    s.char_indices().nth(column).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StringSource;

    fn buffer(text: &str) -> LineBuffer<StringSource> {
        LineBuffer::new(StringSource::from_text(text))
    }

    // ---- Lazy access ----

    #[test]
    fn test_lazy_read_loads_only_what_is_needed() {
        let mut buf = buffer("A text\nwith several\nlines");
        assert_eq!(buf.line(1).unwrap(), "with several\n");
        // The third line has not been read yet
        assert_eq!(buf.loaded_count(), 2);
        assert!(!buf.is_fully_loaded());
    }

    #[test]
    fn test_out_of_order_access_loads_intervening_lines() {
        let mut buf = buffer("A text\nwith several\nlines");
        assert_eq!(buf.line(2).unwrap(), "lines");
        assert_eq!(buf.line(0).unwrap(), "A text\n");
        assert_eq!(buf.line(1).unwrap(), "with several\n");
        assert_eq!(buf.loaded_count(), 3);
    }

    #[test]
    fn test_read_past_end_is_out_of_range() {
        let mut buf = buffer("A text\nwith several\nlines");
        assert!(matches!(
            buf.line(3),
            Err(BufferError::OutOfRange { index: 3, loaded: 3 })
        ));
    }

    #[test]
    fn test_trailing_terminator_yields_dummy_line() {
        let mut buf = buffer("A text\nwith several\nlines\n");
        assert_eq!(buf.line_count().unwrap(), 4);
        assert_eq!(buf.line(3).unwrap(), "");
    }

    #[test]
    fn test_empty_source_yields_single_empty_line() {
        let mut buf = buffer("");
        assert_eq!(buf.line(0).unwrap(), "");
        assert_eq!(buf.line_count().unwrap(), 1);
    }

    #[test]
    fn test_normalization_happens_once() {
        let mut buf = buffer("a\n");
        assert_eq!(buf.line_count().unwrap(), 2);
        // Reading past the end again must not grow the buffer further
        assert!(buf.line(5).is_err());
        assert_eq!(buf.loaded_count(), 2);
    }

    #[test]
    fn test_line_count_forces_full_load() {
        let mut buf = buffer("a\nb\nc");
        assert_eq!(buf.line_count().unwrap(), 3);
        assert!(buf.is_fully_loaded());
    }

    #[test]
    fn test_last_line() {
        let mut buf = buffer("a\nb\nc");
        assert_eq!(buf.last_line().unwrap(), "c");
    }

    #[test]
    fn test_last_line_after_trailing_terminator_is_dummy() {
        let mut buf = buffer("a\nb\n");
        assert_eq!(buf.last_line().unwrap(), "");
    }

    // ---- Indexed writes ----

    #[test]
    fn test_set_line_requires_loaded_index() {
        let mut buf = buffer("a\nb\nc");
        assert!(matches!(
            buf.set_line(1, "x\n"),
            Err(BufferError::OutOfRange { .. })
        ));
        buf.line(1).unwrap();
        buf.set_line(1, "x\n").unwrap();
        assert_eq!(buf.line(1).unwrap(), "x\n");
    }

    #[test]
    fn test_insert_line_normalizes_terminator() {
        let mut buf = buffer("a\nb\n");
        buf.insert_line(1, "inserted").unwrap();
        assert_eq!(buf.line(1).unwrap(), "inserted\n");
    }

    #[test]
    fn test_insert_line_keeps_existing_terminator() {
        let mut buf = buffer("a\nb\n");
        buf.insert_line(1, "inserted\r\n").unwrap();
        assert_eq!(buf.line(1).unwrap(), "inserted\r\n");
    }

    #[test]
    fn test_insert_line_beyond_end_is_out_of_range() {
        let mut buf = buffer("a\nb");
        assert!(matches!(
            buf.insert_line(5, "x"),
            Err(BufferError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_append_fixes_unterminated_tail() {
        let mut buf = buffer("first\ntext");
        buf.append_line("A last line").unwrap();
        assert_eq!(buf.line(1).unwrap(), "text\n");
        assert_eq!(buf.line(2).unwrap(), "A last line");
    }

    #[test]
    fn test_append_skips_fix_for_empty_tail() {
        // A trailing terminator normalizes to an empty dummy line; appending
        // after it must not give the empty line a terminator.
        let mut buf = buffer("a\n");
        buf.append_line("b").unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        assert_eq!(lines, vec!["a\n", "", "b"]);
    }

    #[test]
    fn test_extend_fixes_tail_once() {
        let mut buf = buffer("a\ntail");
        buf.extend_lines(["x\n", "y"]).unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        assert_eq!(lines, vec!["a\n", "tail\n", "x\n", "y"]);
    }

    #[test]
    fn test_remove_line_returns_it() {
        let mut buf = buffer("a\nb\nc");
        buf.load_all().unwrap();
        assert_eq!(buf.remove_line(1).unwrap(), "b\n");
        assert_eq!(buf.line_count().unwrap(), 2);
        assert!(matches!(
            buf.remove_line(5),
            Err(BufferError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_clear_then_read_yields_empty_document() {
        let mut buf = buffer("a\nb\nc");
        buf.line(0).unwrap();
        buf.clear().unwrap();
        assert_eq!(buf.loaded_count(), 0);
        // The source now reads as empty, which normalizes to one empty line
        assert_eq!(buf.line(0).unwrap(), "");
        assert_eq!(buf.line_count().unwrap(), 1);
    }

    #[test]
    fn test_reload_discards_edits() {
        let mut buf = buffer("a\nb\n");
        buf.line(0).unwrap();
        buf.set_line(0, "edited\n").unwrap();
        buf.reload().unwrap();
        assert_eq!(buf.line(0).unwrap(), "a\n");
        assert_eq!(buf.line_count().unwrap(), 3);
    }

    // ---- Annotations ----

    #[test]
    fn test_annotation_roundtrip() {
        let mut buf: LineBuffer<StringSource, u32> =
            LineBuffer::new(StringSource::from_text("a\nb\n"));
        buf.line(0).unwrap();
        buf.set_annotation(0, 7).unwrap();
        assert_eq!(buf.annotation(0), Some(&7));
        assert_eq!(buf.annotation(1), None);
    }

    #[test]
    fn test_set_line_clears_annotation() {
        let mut buf: LineBuffer<StringSource, u32> =
            LineBuffer::new(StringSource::from_text("a\nb\n"));
        buf.line(0).unwrap();
        buf.set_annotation(0, 7).unwrap();
        buf.set_line(0, "changed\n").unwrap();
        assert_eq!(buf.annotation(0), None);
    }

    #[test]
    fn test_tail_fix_clears_annotation() {
        let mut buf: LineBuffer<StringSource, u32> =
            LineBuffer::new(StringSource::from_text("a\nend"));
        buf.line(1).unwrap();
        buf.load_all().unwrap();
        buf.set_annotation(1, 9).unwrap();
        buf.append_line("more").unwrap();
        // The tail was rewritten ("end" -> "end\n"), so its annotation is gone
        assert_eq!(buf.line(1).unwrap(), "end\n");
        assert_eq!(buf.annotation(1), None);
    }

    #[test]
    fn test_set_annotation_requires_loaded_index() {
        let mut buf: LineBuffer<StringSource, u32> =
            LineBuffer::new(StringSource::from_text("a\nb\n"));
        assert!(matches!(
            buf.set_annotation(0, 1),
            Err(BufferError::OutOfRange { .. })
        ));
    }

    // ---- delete_range ----

    #[test]
    fn test_delete_range_within_a_line() {
        let mut buf = buffer("A text\nwith several\nlines");
        let removed = buf
            .delete_range(Position::new(1, 2), Position::new(1, 3))
            .unwrap();
        assert_eq!(removed, "t");
        assert_eq!(buf.line(1).unwrap(), "wih several\n");

        let removed = buf
            .delete_range(Position::new(1, 3), Position::new(1, 4))
            .unwrap();
        assert_eq!(removed, " ");
        assert_eq!(buf.line(1).unwrap(), "wihseveral\n");
    }

    #[test]
    fn test_delete_range_spanning_lines() {
        let mut buf = buffer("A text\nwith several\nlines");
        let removed = buf
            .delete_range(Position::new(0, 5), Position::new(2, 2))
            .unwrap();
        assert_eq!(removed, "t\nwith several\nli");
        assert_eq!(buf.line(0).unwrap(), "A texnes");
        assert!(matches!(buf.line(1), Err(BufferError::OutOfRange { .. })));
    }

    #[test]
    fn test_delete_range_empty_selection() {
        let mut buf = buffer("abc\n");
        let removed = buf
            .delete_range(Position::new(0, 1), Position::new(0, 1))
            .unwrap();
        assert_eq!(removed, "");
        assert_eq!(buf.line(0).unwrap(), "abc\n");
    }

    #[test]
    fn test_delete_range_columns_clamp_to_line_end() {
        let mut buf = buffer("ab\ncd\n");
        // Column 99 clamps to the end of the line, terminator included
        let removed = buf
            .delete_range(Position::new(0, 1), Position::new(0, 99))
            .unwrap();
        assert_eq!(removed, "b\n");
        assert_eq!(buf.line(0).unwrap(), "a");
    }

    #[test]
    fn test_delete_range_reversed_is_invalid() {
        let mut buf = buffer("abc\ndef\n");
        assert!(matches!(
            buf.delete_range(Position::new(1, 0), Position::new(0, 2)),
            Err(BufferError::InvalidPosition { .. })
        ));
        assert!(matches!(
            buf.delete_range(Position::new(0, 2), Position::new(0, 1)),
            Err(BufferError::InvalidPosition { .. })
        ));
        // Nothing was mutated
        assert_eq!(buf.line(0).unwrap(), "abc\n");
        assert_eq!(buf.line(1).unwrap(), "def\n");
    }

    #[test]
    fn test_delete_range_beyond_end_is_out_of_range() {
        let mut buf = buffer("abc\n");
        assert!(matches!(
            buf.delete_range(Position::new(0, 0), Position::new(9, 0)),
            Err(BufferError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_delete_range_counts_characters_not_bytes() {
        let mut buf = buffer("héllo\n");
        let removed = buf
            .delete_range(Position::new(0, 1), Position::new(0, 2))
            .unwrap();
        assert_eq!(removed, "é");
        assert_eq!(buf.line(0).unwrap(), "hllo\n");
    }

    // ---- split / merge ----

    #[test]
    fn test_split_line_mid_line() {
        let mut buf = buffer("alpha\nbeta\n");
        buf.split_line(0, 2, "\n").unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        assert_eq!(lines, vec!["al\n", "pha\n", "beta\n"]);
    }

    #[test]
    fn test_split_last_line_appends() {
        let mut buf = buffer("alpha\nbeta");
        buf.line(1).unwrap();
        buf.split_line(1, 2, "\n").unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        assert_eq!(lines, vec!["alpha\n", "be\n", "ta"]);
    }

    #[test]
    fn test_split_empty_buffer_line() {
        let mut buf = buffer("");
        buf.line(0).unwrap();
        buf.split_line(0, 0, "\n").unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        assert_eq!(lines, vec!["\n", ""]);
    }

    #[test]
    fn test_merge_lines() {
        let mut buf = buffer("one\ntwo\nthree\nfour\n");
        buf.merge_lines(0, 2).unwrap();
        let count = buf.line_count().unwrap();
        assert_eq!(buf.line(0).unwrap(), "onetwothree\n");
        assert_eq!(buf.line(1).unwrap(), "four\n");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_merge_lines_empty_range_is_noop() {
        let mut buf = buffer("a\nb\n");
        buf.merge_lines(1, 1).unwrap();
        buf.merge_lines(2, 1).unwrap();
        assert_eq!(buf.line(0).unwrap(), "a\n");
        assert_eq!(buf.line(1).unwrap(), "b\n");
    }

    #[test]
    fn test_split_then_merge_restores_content() {
        let mut buf = buffer("alpha beta\ngamma\n");
        buf.split_line(0, 5, "\n").unwrap();
        buf.merge_lines(0, 1).unwrap();
        assert_eq!(buf.line(0).unwrap(), "alpha beta\n");
        assert_eq!(buf.line(1).unwrap(), "gamma\n");
    }

    // ---- insert_at_position ----

    #[test]
    fn test_insert_plain_text_splices_into_line() {
        let mut buf = buffer("hello world\n");
        buf.insert_at_position(Position::new(0, 5), ",").unwrap();
        assert_eq!(buf.line(0).unwrap(), "hello, world\n");
    }

    #[test]
    fn test_insert_text_with_crlf_preserves_it_verbatim() {
        let mut buf = buffer("alpha\nbeta\n");
        buf.insert_at_position(Position::new(0, 3), "X\r\nY").unwrap();
        let count = buf.line_count().unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        assert_eq!(lines, vec!["alpX\r\n", "Yha\n", "beta\n", ""]);
        assert_eq!(count, 4);
    }

    #[test]
    fn test_insert_text_with_middle_segments() {
        let mut buf = buffer("ab\n");
        buf.insert_at_position(Position::new(0, 1), "1\n2\n3").unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        // Realizing past "ab\n" during the edit also realized the dummy
        // line after the trailing terminator
        assert_eq!(lines, vec!["a1\n", "2\n", "3b\n", ""]);
    }

    #[test]
    fn test_insert_text_ending_in_terminator() {
        let mut buf = buffer("ab\n");
        buf.insert_at_position(Position::new(0, 1), "x\n").unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        assert_eq!(lines, vec!["ax\n", "b\n", ""]);
    }

    #[test]
    fn test_insert_text_into_unterminated_last_line() {
        let mut buf = buffer("end");
        buf.insert_at_position(Position::new(0, 1), "x\ny").unwrap();
        let lines: Vec<_> = buf.iter_loaded().collect();
        assert_eq!(lines, vec!["ex\n", "ynd"]);
    }

    #[test]
    fn test_insert_empty_text_is_noop() {
        let mut buf = buffer("ab\n");
        buf.insert_at_position(Position::new(0, 1), "").unwrap();
        assert_eq!(buf.line(0).unwrap(), "ab\n");
    }

    #[test]
    fn test_insert_at_line_end_column() {
        let mut buf = buffer("ab\n");
        buf.insert_at_position(Position::new(0, 2), "c").unwrap();
        assert_eq!(buf.line(0).unwrap(), "abc\n");
    }

    #[test]
    fn test_insert_past_line_end_is_invalid() {
        let mut buf = buffer("ab\n");
        assert!(matches!(
            buf.insert_at_position(Position::new(0, 3), "x"),
            Err(BufferError::InvalidPosition { .. })
        ));
        assert_eq!(buf.line(0).unwrap(), "ab\n");
    }

    #[test]
    fn test_insert_beyond_last_line_is_invalid() {
        let mut buf = buffer("ab\n");
        assert!(matches!(
            buf.insert_at_position(Position::new(9, 0), "x"),
            Err(BufferError::InvalidPosition { line: 9, .. })
        ));
    }

    // ---- Round trip ----

    #[test]
    fn test_full_load_preserves_bytes() {
        let text = "a\nb\r\nc\rd\n";
        let mut buf = buffer(text);
        buf.load_all().unwrap();
        let rebuilt: String = buf.iter_loaded().collect();
        assert_eq!(rebuilt, text);
    }
}
