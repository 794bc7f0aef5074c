//! Translation between absolute offsets, chunk positions, lines and columns.
//!
//! Everything here is a linear scan over the chain. Callers should start a
//! scan from the closest known position (the cursor or the viewport anchor)
//! rather than from the start of the buffer.

use crate::chain::ChunkChain;
use crate::error::BufferError;
use crate::pool::ChunkId;

/// A byte position inside a chain
///
/// `abs` always equals the sum of the lengths of the chunks before `chunk`
/// plus `offset`. The position past the last byte of a chunk is valid and
/// means "just before the first byte of the next chunk".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub chunk: ChunkId,
    pub offset: usize,
    pub abs: usize,
}

/// Number of screen cells `byte` takes when drawn at `column`
///
/// Tabs advance to the next tab stop, other control bytes are drawn in caret
/// notation (`^A`) and everything else takes one cell. A tab stop of 0 is
/// treated as 1.
pub fn display_width(byte: u8, column: usize, tab_stop: usize) -> usize {
    let tab_stop = tab_stop.max(1);
    match byte {
        b'\t' => tab_stop - column % tab_stop,
        0..=31 => 2,
        _ => 1,
    }
}

/// Bidirectional byte cursor that follows chunk links
#[derive(Debug, Clone)]
pub struct ByteWalker<'a> {
    chain: &'a ChunkChain,
    chunk: ChunkId,
    offset: usize,
    abs: usize,
}

impl<'a> ByteWalker<'a> {
    pub fn new(chain: &'a ChunkChain, pos: Position) -> Self {
        Self {
            chain,
            chunk: pos.chunk,
            offset: pos.offset,
            abs: pos.abs,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            chunk: self.chunk,
            offset: self.offset,
            abs: self.abs,
        }
    }

    pub fn abs(&self) -> usize {
        self.abs
    }

    /// Return the byte after the walker and step over it
    pub fn next_byte(&mut self) -> Option<u8> {
        loop {
            let bytes = self.chain.bytes(self.chunk);
            if let Some(&byte) = bytes.get(self.offset) {
                self.offset += 1;
                self.abs += 1;
                return Some(byte);
            }
            let next = self.chain.next(self.chunk)?;
            self.chunk = next;
            self.offset = 0;
        }
    }

    /// Return the byte before the walker and step back over it
    pub fn prev_byte(&mut self) -> Option<u8> {
        loop {
            if self.offset > 0 {
                self.offset -= 1;
                self.abs -= 1;
                return Some(self.chain.bytes(self.chunk)[self.offset]);
            }
            let prev = self.chain.prev(self.chunk)?;
            self.chunk = prev;
            self.offset = self.chain.chunk_len(prev);
        }
    }
}

impl Iterator for ByteWalker<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        self.next_byte()
    }
}

impl ChunkChain {
    /// Resolve an absolute offset to a chunk position
    ///
    /// Offsets inside the buffer resolve to the chunk holding that byte; the
    /// buffer size resolves to the end of the last chunk.
    pub fn locate(&self, abs: usize) -> Result<Position, BufferError> {
        self.scan_for(self.begin(), 0, abs)
    }

    /// Like [`Self::locate`], starting the scan at `hint`'s chunk when that
    /// chunk does not start after `abs`
    pub fn locate_from(&self, hint: Position, abs: usize) -> Result<Position, BufferError> {
        match hint.abs.checked_sub(hint.offset) {
            Some(chunk_start) if chunk_start <= abs && self.is_live(hint.chunk) => {
                self.scan_for(hint.chunk, chunk_start, abs)
            }
            _ => self.locate(abs),
        }
    }

    fn scan_for(&self, from: ChunkId, from_start: usize, abs: usize) -> Result<Position, BufferError> {
        let size = self.len();
        if abs > size {
            return Err(BufferError::OutOfRange { offset: abs, size });
        }
        if abs == size {
            return Ok(self.end_position());
        }

        let mut base = from_start;
        let mut id = Some(from);
        while let Some(chunk) = id {
            let len = self.chunk_len(chunk);
            if abs < base + len {
                return Ok(Position {
                    chunk,
                    offset: abs - base,
                    abs,
                });
            }
            base += len;
            id = self.next(chunk);
        }
        Err(BufferError::OutOfRange { offset: abs, size })
    }

    /// The byte at `pos`, if `pos` is not past its chunk's end
    pub fn byte_at(&self, pos: Position) -> Option<u8> {
        self.bytes(pos.chunk).get(pos.offset).copied()
    }

    /// Start of `line` (0-based)
    pub fn line_start(&self, line: usize) -> Result<Position, BufferError> {
        self.line_start_from(self.start_position(), 0, line)
    }

    /// Start of `line`, scanning forward from `from`, the known start of
    /// `from_line`
    ///
    /// Lines before `from_line` are found by scanning from the buffer start.
    pub fn line_start_from(
        &self,
        from: Position,
        from_line: usize,
        line: usize,
    ) -> Result<Position, BufferError> {
        if line < from_line {
            return self.line_start(line);
        }
        if line == from_line {
            return Ok(from);
        }

        let mut walker = ByteWalker::new(self, from);
        let mut current = from_line;
        while let Some(byte) = walker.next_byte() {
            if byte == b'\n' {
                current += 1;
                if current == line {
                    return Ok(walker.position());
                }
            }
        }
        Err(BufferError::LineNotFound {
            line,
            line_count: current + 1,
        })
    }

    /// Start of the line containing `pos`
    pub fn line_start_before(&self, pos: Position) -> Position {
        let mut walker = ByteWalker::new(self, pos);
        while let Some(byte) = walker.prev_byte() {
            if byte == b'\n' {
                walker.next_byte();
                return walker.position();
            }
        }
        walker.position()
    }

    /// Start of the line before the one starting at `line_start`
    pub fn prev_line_start(&self, line_start: Position) -> Option<Position> {
        let mut walker = ByteWalker::new(self, line_start);
        walker.prev_byte()?;
        Some(self.line_start_before(walker.position()))
    }

    /// Start of the line after the one containing `pos`
    pub fn next_line_start(&self, pos: Position) -> Option<Position> {
        let mut walker = ByteWalker::new(self, pos);
        while let Some(byte) = walker.next_byte() {
            if byte == b'\n' {
                return Some(walker.position());
            }
        }
        None
    }

    /// Offset of the newline ending the line that contains `abs`, or the
    /// buffer size on the last line
    pub fn line_end(&self, abs: usize) -> Result<usize, BufferError> {
        let mut walker = ByteWalker::new(self, self.locate(abs)?);
        while let Some(byte) = walker.next_byte() {
            if byte == b'\n' {
                return Ok(walker.abs() - 1);
            }
        }
        Ok(walker.abs())
    }

    /// Display column of `abs`, measured from the line starting at `start`
    pub fn column_between(&self, start: Position, abs: usize, tab_stop: usize) -> usize {
        let mut walker = ByteWalker::new(self, start);
        let mut column = 0;
        while walker.abs() < abs {
            match walker.next_byte() {
                Some(b'\n') | None => break,
                Some(byte) => column += display_width(byte, column, tab_stop),
            }
        }
        column
    }

    /// Display column of `pos` within its own line
    pub fn column_at(&self, pos: Position, tab_stop: usize) -> usize {
        let start = self.line_start_before(pos);
        self.column_between(start, pos.abs, tab_stop)
    }

    /// Display column of `abs` on `line`
    ///
    /// `abs` must lie between the line's start and its end (the newline's
    /// offset, or the buffer size on the last line).
    pub fn visual_column(
        &self,
        line: usize,
        abs: usize,
        tab_stop: usize,
    ) -> Result<usize, BufferError> {
        let size = self.len();
        if abs > size {
            return Err(BufferError::OutOfRange { offset: abs, size });
        }
        let start = self.line_start(line)?;
        if abs < start.abs || abs > self.line_end(start.abs)? {
            return Err(BufferError::OutOfRange { offset: abs, size });
        }
        Ok(self.column_between(start, abs, tab_stop))
    }

    /// Walk from a line start towards `goal` display columns
    ///
    /// Stops at the line's end, or before a byte that would carry the column
    /// past `goal`. Returns the position reached and its column.
    pub fn seek_column(&self, line_start: Position, goal: usize, tab_stop: usize) -> (Position, usize) {
        let mut walker = ByteWalker::new(self, line_start);
        let mut column = 0;
        while column < goal {
            let mut ahead = walker.clone();
            let width = match ahead.next_byte() {
                Some(b'\n') | None => break,
                Some(byte) => display_width(byte, column, tab_stop),
            };
            if column + width > goal {
                break;
            }
            column += width;
            walker = ahead;
        }
        (walker.position(), column)
    }
}
