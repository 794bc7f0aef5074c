//! Cursor state and navigation.

use crate::buffer::Buffer;
use crate::mapper::{display_width, ByteWalker, Position};

/// Cursor movement commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// Insertion point plus its line/column coordinates
///
/// `goal_column` is the column vertical movement tries to return to; it is
/// reset by every horizontal movement and edit, and left alone by
/// Up/Down/PageUp/PageDown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub(crate) pos: Position,
    pub(crate) line: usize,
    pub(crate) column: usize,
    pub(crate) goal_column: usize,
}

impl Cursor {
    /// Cursor at the start of a line
    pub(crate) fn at_line_start(pos: Position, line: usize) -> Self {
        Self {
            pos,
            line,
            column: 0,
            goal_column: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn offset(&self) -> usize {
        self.pos.abs
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn goal_column(&self) -> usize {
        self.goal_column
    }
}

impl Buffer {
    /// Move the cursor
    ///
    /// Movements that would leave the buffer are no-ops.
    pub fn move_cursor(&mut self, direction: Direction) {
        self.ensure_cursor_consistent();
        let moved = match direction {
            Direction::Left => self.step_left(),
            Direction::Right => self.step_right(),
            Direction::Up => self.step_vertical(true),
            Direction::Down => self.step_vertical(false),
            Direction::PageUp => self.step_page(true),
            Direction::PageDown => self.step_page(false),
            Direction::Home => Some(self.line_home()),
            Direction::End => Some(self.line_end_cursor()),
        };
        if let Some(cursor) = moved {
            tracing::trace!(
                "cursor {:?} -> offset {} line {} column {}",
                direction,
                cursor.pos.abs,
                cursor.line,
                cursor.column
            );
            self.cursor = cursor;
        }
    }

    /// Position of the byte just before the cursor
    pub(crate) fn position_before_cursor(&self) -> Option<Position> {
        let pos = self.cursor.pos;
        if pos.abs == 0 {
            return None;
        }
        if pos.offset > 0 {
            return Some(Position {
                chunk: pos.chunk,
                offset: pos.offset - 1,
                abs: pos.abs - 1,
            });
        }
        if let Some(prev) = self.chain.prev(pos.chunk) {
            let len = self.chain.chunk_len(prev);
            if len > 0 {
                return Some(Position {
                    chunk: prev,
                    offset: len - 1,
                    abs: pos.abs - 1,
                });
            }
        }
        self.chain.locate(pos.abs - 1).ok()
    }

    fn step_left(&self) -> Option<Cursor> {
        let before = self.position_before_cursor()?;
        let byte = self.chain.byte_at(before)?;
        let line = if byte == b'\n' {
            self.cursor.line.saturating_sub(1)
        } else {
            self.cursor.line
        };
        let column = if byte >= 0x20 {
            self.cursor.column.saturating_sub(1)
        } else {
            self.chain.column_at(before, self.tab_stop)
        };
        Some(Cursor {
            pos: before,
            line,
            column,
            goal_column: column,
        })
    }

    fn step_right(&self) -> Option<Cursor> {
        let mut walker = ByteWalker::new(&self.chain, self.cursor.pos);
        let byte = walker.next_byte()?;
        let (line, column) = if byte == b'\n' {
            (self.cursor.line + 1, 0)
        } else {
            (
                self.cursor.line,
                self.cursor.column + display_width(byte, self.cursor.column, self.tab_stop),
            )
        };
        Some(Cursor {
            pos: walker.position(),
            line,
            column,
            goal_column: column,
        })
    }

    fn step_vertical(&self, up: bool) -> Option<Cursor> {
        let (start, line) = if up {
            let current = self.chain.line_start_before(self.cursor.pos);
            let start = self.chain.prev_line_start(current)?;
            (start, self.cursor.line.saturating_sub(1))
        } else {
            let start = self.chain.next_line_start(self.cursor.pos)?;
            (start, self.cursor.line + 1)
        };
        let (pos, column) = self
            .chain
            .seek_column(start, self.cursor.goal_column, self.tab_stop);
        Some(Cursor {
            pos,
            line,
            column,
            goal_column: self.cursor.goal_column,
        })
    }

    fn step_page(&mut self, up: bool) -> Option<Cursor> {
        let rows = self.viewport.height.max(1);
        let mut start = self.chain.line_start_before(self.cursor.pos);
        let mut line = self.cursor.line;
        for _ in 0..rows {
            let next = if up {
                self.chain.prev_line_start(start)
            } else {
                self.chain.next_line_start(start)
            };
            let Some(next) = next else { break };
            start = next;
            line = if up { line.saturating_sub(1) } else { line + 1 };
        }

        let (pos, column) = self
            .chain
            .seek_column(start, self.cursor.goal_column, self.tab_stop);

        if up {
            self.viewport.set_top_line_at(line, start);
        } else {
            self.viewport.set_top_line(line.saturating_sub(rows - 1));
        }

        Some(Cursor {
            pos,
            line,
            column,
            goal_column: self.cursor.goal_column,
        })
    }

    fn line_home(&self) -> Cursor {
        let start = self.chain.line_start_before(self.cursor.pos);
        Cursor::at_line_start(start, self.cursor.line)
    }

    fn line_end_cursor(&self) -> Cursor {
        let mut walker = ByteWalker::new(&self.chain, self.cursor.pos);
        let mut column = self.cursor.column;
        loop {
            let mut ahead = walker.clone();
            match ahead.next_byte() {
                Some(b'\n') | None => break,
                Some(byte) => column += display_width(byte, column, self.tab_stop),
            }
            walker = ahead;
        }
        Cursor {
            pos: walker.position(),
            line: self.cursor.line,
            column,
            goal_column: column,
        }
    }
}
