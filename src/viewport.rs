//! Visible window state and the cached position of its first line.

use crate::chain::ChunkChain;
use crate::mapper::Position;
use crate::pool::ChunkId;

/// Window onto the buffer
///
/// `anchor` caches the position of the start of `top_line`, so lookups near
/// the screen can skip the scan from the start of the buffer. Any edit at or
/// before the anchor, or freeing the anchor's chunk, drops the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub top_line: usize,
    pub left_column: usize,
    pub height: usize,
    pub width: usize,
    anchor: Option<Position>,
}

impl Viewport {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            top_line: 0,
            left_column: 0,
            height,
            width,
            anchor: None,
        }
    }

    pub fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    /// Move the top of the window to `line`, whose start is known to be at `start`
    pub(crate) fn set_top_line_at(&mut self, line: usize, start: Position) {
        self.top_line = line;
        self.anchor = Some(start);
    }

    /// Move the top of the window, dropping the anchor if the line changed
    pub fn set_top_line(&mut self, line: usize) {
        if line != self.top_line {
            self.top_line = line;
            self.anchor = None;
        }
    }

    pub fn invalidate(&mut self) {
        self.anchor = None;
    }

    /// Drop the anchor if an edit at `edit_abs` may have moved it
    pub fn invalidate_for_edit(&mut self, edit_abs: usize) {
        if self.anchor.is_some_and(|anchor| anchor.abs >= edit_abs) {
            tracing::trace!("edit at {} invalidates viewport anchor", edit_abs);
            self.anchor = None;
        }
    }

    /// Drop the anchor if it points into a chunk that is gone
    pub fn invalidate_for_chunk(&mut self, chunk: ChunkId) {
        if self.anchor.is_some_and(|anchor| anchor.chunk == chunk) {
            self.anchor = None;
        }
    }

    /// Position of the start of `top_line`, recomputing it if needed
    ///
    /// A `top_line` past the end of the buffer falls back to line 0.
    pub fn resolve(&mut self, chain: &ChunkChain) -> Position {
        if let Some(anchor) = self.anchor {
            return anchor;
        }
        let start = match chain.line_start(self.top_line) {
            Ok(start) => start,
            Err(e) => {
                tracing::debug!("viewport top line unavailable ({}), resetting to 0", e);
                self.top_line = 0;
                chain.start_position()
            }
        };
        self.anchor = Some(start);
        start
    }

    /// Scroll the minimum amount needed to show `line`/`column`
    pub fn scroll_to(&mut self, line: usize, column: usize) {
        let height = self.height.max(1);
        if line < self.top_line {
            self.set_top_line(line);
        } else if line >= self.top_line + height {
            self.set_top_line(line + 1 - height);
        }

        let width = self.width.max(1);
        if column < self.left_column {
            self.left_column = column;
        } else if column >= self.left_column + width {
            self.left_column = column + 1 - width;
        }
    }

    pub fn resize(&mut self, height: usize, width: usize) {
        self.height = height;
        self.width = width;
    }

    pub(crate) fn reset(&mut self) {
        self.top_line = 0;
        self.left_column = 0;
        self.anchor = None;
    }
}
