use crate::chain::ChunkChain;
use crate::config::BufferConfig;
use crate::cursor::{Cursor, Direction};
use crate::error::BufferError;
use crate::mapper::{display_width, ByteWalker, Position};
use crate::pool::ChunkPool;
use crate::viewport::Viewport;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Pool occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub chunk_capacity: usize,
    pub used: usize,
    pub free: usize,
}

/// A text buffer stored as a chain of fixed-size chunks, with one cursor
/// and one viewport
pub struct Buffer {
    /// Byte storage; owns the chunk pool
    pub(crate) chain: ChunkChain,

    pub(crate) cursor: Cursor,

    /// Visible window plus the cached start of its first line
    pub(crate) viewport: Viewport,

    pub(crate) tab_stop: usize,

    /// Optional file path for persistence
    file_path: Option<PathBuf>,

    /// Has the buffer been modified since last load/save?
    dirty: bool,
}

impl Buffer {
    /// Create an empty buffer with its own pool
    ///
    /// A config that fails [`BufferConfig::validate`] is rejected with
    /// `InvalidConfig`.
    pub fn new(config: &BufferConfig) -> Result<Self, BufferError> {
        config
            .validate()
            .map_err(|e| BufferError::InvalidConfig(e.to_string()))?;
        let pool = ChunkPool::new(config.chunk_capacity, config.chunk_count)?;
        Self::with_pool(pool, config)
    }

    /// Create an empty buffer on an existing pool, e.g. one handed back by
    /// [`Self::destroy`]
    ///
    /// The pool's chunk capacity wins over `config.chunk_capacity`.
    pub fn with_pool(pool: ChunkPool, config: &BufferConfig) -> Result<Self, BufferError> {
        let chain = ChunkChain::new(pool)?;
        let cursor = Cursor::at_line_start(chain.start_position(), 0);
        Ok(Self {
            chain,
            cursor,
            viewport: Viewport::new(config.screen_rows, config.screen_cols),
            tab_stop: config.tab_stop.max(1),
            file_path: None,
            dirty: false,
        })
    }

    /// Open `path` into a new buffer
    ///
    /// A missing file gives an empty, clean buffer that will be saved to `path`.
    pub fn open_file<P: AsRef<Path>>(path: P, config: &BufferConfig) -> Result<Self, BufferError> {
        let path = path.as_ref();
        let mut buffer = Self::new(config)?;
        buffer.file_path = Some(path.to_path_buf());

        match File::open(path) {
            Ok(file) => {
                buffer.load_from_reader(BufReader::new(file))?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist, starting a new file", path.display());
            }
            Err(e) => return Err(e.into()),
        }
        Ok(buffer)
    }

    /// Give every chunk back and return the pool for reuse
    pub fn destroy(self) -> ChunkPool {
        self.chain.into_pool()
    }

    /// Replace the contents with everything `reader` yields
    ///
    /// Leaves the cursor at offset 0 and the buffer clean. On error the bytes
    /// read so far stay in the buffer and it is left dirty.
    pub fn load_from_reader<R: Read>(&mut self, mut reader: R) -> Result<usize, BufferError> {
        self.clear();
        let mut chunk = [0u8; 8192];
        let mut total = 0;

        let result = loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => break Ok(total),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(BufferError::from(e)),
            };
            if let Err(e) = self.insert_bytes(&chunk[..n]) {
                break Err(e);
            }
            total += n;
        };

        self.place_cursor(0);
        let total = result?;
        self.dirty = false;
        tracing::debug!(
            "loaded {} bytes into {} chunks",
            total,
            self.chain.pool().used_count()
        );
        Ok(total)
    }

    /// Write the contents, chunk by chunk, to `writer`
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<usize> {
        for id in self.chain.chunks() {
            writer.write_all(self.chain.bytes(id))?;
        }
        writer.flush()?;
        Ok(self.chain.len())
    }

    /// Save to the buffer's file path
    pub fn save(&mut self) -> Result<usize, BufferError> {
        let path = self
            .file_path
            .clone()
            .ok_or_else(|| io::Error::other("No file path set for buffer"))?;
        self.save_to_file(path)
    }

    /// Save to `path` and remember it as the buffer's file path
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, BufferError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let written = self.write_to(BufWriter::new(file))?;
        self.file_path = Some(path.to_path_buf());
        self.dirty = false;
        tracing::debug!("saved {} bytes to {}", written, path.display());
        Ok(written)
    }

    /// Insert `byte` before the cursor and advance past it
    ///
    /// On `OutOfMemory` nothing changes.
    pub fn insert(&mut self, byte: u8) -> Result<(), BufferError> {
        self.ensure_cursor_consistent();
        let before = self.cursor.pos;
        let after = self.chain.insert_byte(before, byte)?;
        self.viewport.invalidate_for_edit(before.abs);

        self.cursor.pos = after;
        if byte == b'\n' {
            self.cursor.line += 1;
            self.cursor.column = 0;
        } else if byte >= 0x20 {
            self.cursor.column += 1;
        } else {
            self.cursor.column = self.chain.column_at(after, self.tab_stop);
        }
        self.cursor.goal_column = self.cursor.column;
        self.dirty = true;
        Ok(())
    }

    /// Insert each byte in turn, stopping at the first failure
    ///
    /// Bytes inserted before the failure are kept.
    pub fn insert_bytes(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        for &byte in bytes {
            self.insert(byte)?;
        }
        Ok(())
    }

    /// Remove the byte before the cursor (backspace). No-op at offset 0.
    pub fn delete_before_cursor(&mut self) {
        self.ensure_cursor_consistent();
        let Some(target) = self.position_before_cursor() else {
            return;
        };

        let removed = self.chain.remove_byte(target);
        self.viewport.invalidate_for_edit(target.abs);
        let cleanup = self.chain.cleanup_after_delete(target);
        for chunk in cleanup.freed() {
            self.viewport.invalidate_for_chunk(chunk);
        }

        self.cursor.pos = cleanup.cursor;
        if removed == b'\n' {
            self.cursor.line = self.cursor.line.saturating_sub(1);
        }
        self.cursor.column = self.chain.column_at(self.cursor.pos, self.tab_stop);
        self.cursor.goal_column = self.cursor.column;
        self.dirty = true;
    }

    /// Remove the byte under the cursor (DEL key). No-op at the end.
    pub fn delete_at_cursor(&mut self) {
        if self.cursor.pos.abs >= self.chain.len() {
            return;
        }
        self.move_cursor(Direction::Right);
        self.delete_before_cursor();
    }

    /// Drop all content
    pub fn clear(&mut self) {
        self.chain.reset();
        self.cursor = Cursor::at_line_start(self.chain.start_position(), 0);
        self.viewport.reset();
        self.dirty = true;
        tracing::debug!("buffer cleared");
    }

    /// Move the cursor to an absolute offset
    ///
    /// Offsets past the end put the cursor at the end and report `OutOfRange`.
    pub fn set_cursor(&mut self, abs: usize) -> Result<(), BufferError> {
        let size = self.chain.len();
        if abs > size {
            tracing::debug!("cursor offset {} past end ({}), clamping", abs, size);
            self.place_cursor(size);
            return Err(BufferError::OutOfRange { offset: abs, size });
        }
        self.place_cursor(abs);
        Ok(())
    }

    /// Move the cursor to the start of `line`
    ///
    /// A missing line puts the cursor at the end and reports `LineNotFound`.
    pub fn goto_line(&mut self, line: usize) -> Result<(), BufferError> {
        let start = match self.viewport.anchor() {
            Some(anchor) if line >= self.viewport.top_line => {
                self.chain
                    .line_start_from(anchor, self.viewport.top_line, line)
            }
            _ => self.chain.line_start(line),
        };
        match start {
            Ok(pos) => {
                self.cursor = Cursor::at_line_start(pos, line);
                Ok(())
            }
            Err(e) => {
                self.place_cursor(self.chain.len());
                Err(e)
            }
        }
    }

    /// Put the cursor at `abs` (which must be in range) and recompute its
    /// line and column
    ///
    /// Scans from the viewport anchor when it is at or before `abs`,
    /// otherwise from the start of the buffer.
    pub(crate) fn place_cursor(&mut self, abs: usize) {
        let (start, mut line) = match self.viewport.anchor() {
            Some(anchor) if anchor.abs <= abs => (anchor, self.viewport.top_line),
            _ => (self.chain.start_position(), 0),
        };

        let mut walker = ByteWalker::new(&self.chain, start);
        let mut column = 0;
        while walker.abs() < abs {
            match walker.next_byte() {
                Some(b'\n') => {
                    line += 1;
                    column = 0;
                }
                Some(byte) => column += display_width(byte, column, self.tab_stop),
                None => break,
            }
        }

        self.cursor = Cursor {
            pos: walker.position(),
            line,
            column,
            goal_column: column,
        };
    }

    /// Cheap cursor sanity check before every edit and movement
    ///
    /// Debug builds panic on a broken cursor; release builds log it and
    /// re-resolve the cursor from its absolute offset.
    pub(crate) fn ensure_cursor_consistent(&mut self) {
        let pos = self.cursor.pos;
        let consistent = pos.abs <= self.chain.len()
            && self.chain.is_live(pos.chunk)
            && pos.offset <= self.chain.chunk_len(pos.chunk);
        debug_assert!(consistent, "cursor {:?} does not match the chain", pos);
        if consistent {
            return;
        }

        tracing::warn!("cursor {:?} does not match the chain, re-resolving", pos);
        self.viewport.invalidate();
        self.place_cursor(pos.abs.min(self.chain.len()));
    }

    /// Adjust the viewport so the cursor is on screen
    pub fn scroll(&mut self) {
        self.viewport.scroll_to(self.cursor.line, self.cursor.column);
    }

    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.viewport.resize(rows, cols);
    }

    /// Byte ranges of the lines on screen, newlines excluded
    ///
    /// The last line is included even when empty, so a cursor after a
    /// trailing newline has a row to sit on.
    pub fn visible_lines(&mut self) -> Vec<Range<usize>> {
        let start = self.viewport.resolve(&self.chain);
        let mut walker = ByteWalker::new(&self.chain, start);
        let mut lines = Vec::with_capacity(self.viewport.height);

        while lines.len() < self.viewport.height {
            let line_start = walker.abs();
            let mut ended_by_newline = false;
            let mut line_end = line_start;
            while let Some(byte) = walker.next_byte() {
                if byte == b'\n' {
                    ended_by_newline = true;
                    break;
                }
                line_end = walker.abs();
            }
            lines.push(line_start..line_end);
            if !ended_by_newline {
                break;
            }
        }
        lines
    }

    /// Render `range` the way it appears on screen
    ///
    /// Tabs expand to spaces and control bytes use caret notation.
    pub fn display_text(&self, range: Range<usize>) -> Result<String, BufferError> {
        let mut text = String::new();
        let mut column = 0;
        let tab_stop = self.tab_stop;
        self.for_each_byte_in_range(range.start, range.end, |byte| {
            match byte {
                b'\n' => {
                    text.push('\n');
                    column = 0;
                    return;
                }
                b'\t' => {
                    let width = display_width(byte, column, tab_stop);
                    text.extend(std::iter::repeat(' ').take(width));
                }
                0..=31 => {
                    text.push('^');
                    text.push(char::from(byte + b'@'));
                }
                _ => text.push(char::from(byte)),
            }
            column += display_width(byte, column, tab_stop);
        })?;
        Ok(text)
    }

    /// Visit every byte in `[start, end)` in order
    pub fn for_each_byte_in_range<F: FnMut(u8)>(
        &self,
        start: usize,
        end: usize,
        mut visitor: F,
    ) -> Result<(), BufferError> {
        let size = self.chain.len();
        if end > size {
            return Err(BufferError::OutOfRange { offset: end, size });
        }
        if start > end {
            return Err(BufferError::OutOfRange {
                offset: start,
                size,
            });
        }

        // Start from whichever known position is closest before `start`
        let hint = [Some(self.cursor.pos), self.viewport.anchor()]
            .into_iter()
            .flatten()
            .filter(|pos| pos.abs <= start)
            .max_by_key(|pos| pos.abs)
            .unwrap_or_else(|| self.chain.start_position());
        let mut walker = ByteWalker::new(&self.chain, self.chain.locate_from(hint, start)?);
        while walker.abs() < end {
            match walker.next_byte() {
                Some(byte) => visitor(byte),
                None => break,
            }
        }
        Ok(())
    }

    /// Copy of the whole buffer
    pub fn contents(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.chain.len());
        for id in self.chain.chunks() {
            bytes.extend_from_slice(self.chain.bytes(id));
        }
        bytes
    }

    /// Copy of the bytes in `range`
    pub fn slice(&self, range: Range<usize>) -> Result<Vec<u8>, BufferError> {
        let mut bytes = Vec::with_capacity(range.len());
        self.for_each_byte_in_range(range.start, range.end, |byte| bytes.push(byte))?;
        Ok(bytes)
    }

    pub fn line_count(&self) -> usize {
        1 + self
            .chain
            .chunks()
            .map(|id| self.chain.bytes(id).iter().filter(|&&b| b == b'\n').count())
            .sum::<usize>()
    }

    /// Start offset of `line`
    pub fn line_start(&self, line: usize) -> Result<usize, BufferError> {
        Ok(self.chain.line_start(line)?.abs)
    }

    /// Offset of the end of the line containing `abs`
    pub fn line_end(&self, abs: usize) -> Result<usize, BufferError> {
        self.chain.line_end(abs)
    }

    /// Display column of `abs` on `line`; `abs` must lie on that line
    pub fn visual_column(&self, line: usize, abs: usize) -> Result<usize, BufferError> {
        self.chain.visual_column(line, abs, self.tab_stop)
    }

    pub fn locate(&self, abs: usize) -> Result<Position, BufferError> {
        self.chain.locate(abs)
    }

    pub fn total_size(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_offset(&self) -> usize {
        self.cursor.pos.abs
    }

    pub fn cursor_line(&self) -> usize {
        self.cursor.line
    }

    pub fn cursor_column(&self) -> usize {
        self.cursor.column
    }

    pub fn goal_column(&self) -> usize {
        self.cursor.goal_column
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tab_stop(&self) -> usize {
        self.tab_stop
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn set_file_path(&mut self, path: PathBuf) {
        self.file_path = Some(path);
    }

    pub fn chain(&self) -> &ChunkChain {
        &self.chain
    }

    /// Length of every chunk in chain order
    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.chain
            .chunks()
            .map(|id| self.chain.chunk_len(id))
            .collect()
    }

    pub fn pool_stats(&self) -> PoolStats {
        let pool = self.chain.pool();
        PoolStats {
            chunk_capacity: pool.chunk_capacity(),
            used: pool.used_count(),
            free: pool.free_count(),
        }
    }

    /// Full consistency check of chain, cursor and viewport anchor
    pub fn validate(&self) -> Result<(), String> {
        self.chain.validate()?;

        let check_position = |what: &str, pos: Position| -> Result<(), String> {
            let mut base = 0;
            for id in self.chain.chunks() {
                if id == pos.chunk {
                    if pos.offset > self.chain.chunk_len(id) || base + pos.offset != pos.abs {
                        return Err(format!("{} {:?} is inconsistent", what, pos));
                    }
                    return Ok(());
                }
                base += self.chain.chunk_len(id);
            }
            Err(format!("{} {:?} points outside the chain", what, pos))
        };

        let cursor = self.cursor.pos;
        check_position("cursor", cursor)?;

        let mut line = 0;
        let mut column = 0;
        self.for_each_byte_in_range(0, cursor.abs, |byte| {
            if byte == b'\n' {
                line += 1;
                column = 0;
            } else {
                column += display_width(byte, column, self.tab_stop);
            }
        })
        .map_err(|e| e.to_string())?;
        if (line, column) != (self.cursor.line, self.cursor.column) {
            return Err(format!(
                "cursor at line {} column {}, expected line {} column {}",
                self.cursor.line, self.cursor.column, line, column
            ));
        }

        if let Some(anchor) = self.viewport.anchor() {
            check_position("viewport anchor", anchor)?;
            let expected = self
                .chain
                .line_start(self.viewport.top_line)
                .map_err(|e| e.to_string())?;
            if expected.abs != anchor.abs {
                return Err(format!(
                    "viewport anchor at {} but line {} starts at {}",
                    anchor.abs, self.viewport.top_line, expected.abs
                ));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.chain.len())
            .field("chunks", &self.chunk_sizes())
            .field("cursor", &self.cursor)
            .field("viewport", &self.viewport)
            .field("file_path", &self.file_path)
            .field("dirty", &self.dirty)
            .finish()
    }
}
