//! Doubly-linked chain of pool chunks holding one buffer's bytes.
//!
//! The chain owns its [`ChunkPool`] and links chunks through the pool's
//! slot links. Byte-level edits are bounded by one chunk's capacity:
//!
//! - insert shifts within a chunk, appends a fresh chunk past a full one,
//!   or splits a full chunk at the insertion point
//! - removal shifts within a chunk; [`ChunkChain::cleanup_after_delete`]
//!   then drops an emptied chunk and opportunistically merges neighbours
//!
//! Invariants (checked by [`ChunkChain::validate`]):
//! - the chain always has at least one chunk
//! - `len() == Σ chunk_len`
//! - only the head chunk may be empty

use crate::error::BufferError;
use crate::mapper::Position;
use crate::pool::{ChunkId, ChunkPool};

/// Chunks freed by a delete cleanup, plus where the cursor ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cleanup {
    pub cursor: Position,
    /// Chunk removed because the deletion emptied it
    pub emptied: Option<ChunkId>,
    /// Chunk folded into its predecessor
    pub merged: Option<ChunkId>,
}

impl Cleanup {
    pub fn freed(&self) -> impl Iterator<Item = ChunkId> {
        self.emptied.into_iter().chain(self.merged)
    }
}

#[derive(Debug)]
pub struct ChunkChain {
    pool: ChunkPool,
    begin: ChunkId,
    end: ChunkId,
    size: usize,
}

impl ChunkChain {
    /// Create a chain holding one empty chunk taken from `pool`
    pub fn new(mut pool: ChunkPool) -> Result<Self, BufferError> {
        let head = pool.allocate()?;
        Ok(Self {
            pool,
            begin: head,
            end: head,
            size: 0,
        })
    }

    pub fn begin(&self) -> ChunkId {
        self.begin
    }

    pub fn end(&self) -> ChunkId {
        self.end
    }

    /// Total bytes in the chain
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    pub fn chunk_capacity(&self) -> usize {
        self.pool.chunk_capacity()
    }

    pub fn chunk_len(&self, id: ChunkId) -> usize {
        self.pool.len(id)
    }

    pub fn next(&self, id: ChunkId) -> Option<ChunkId> {
        self.pool.next(id)
    }

    pub fn prev(&self, id: ChunkId) -> Option<ChunkId> {
        self.pool.prev(id)
    }

    pub fn bytes(&self, id: ChunkId) -> &[u8] {
        self.pool.bytes(id)
    }

    pub fn is_live(&self, id: ChunkId) -> bool {
        self.pool.is_live(id)
    }

    /// Iterate over the chain's chunks from `begin` to `end`
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            chain: self,
            next: Some(self.begin),
        }
    }

    pub fn start_position(&self) -> Position {
        Position {
            chunk: self.begin,
            offset: 0,
            abs: 0,
        }
    }

    pub fn end_position(&self) -> Position {
        Position {
            chunk: self.end,
            offset: self.chunk_len(self.end),
            abs: self.size,
        }
    }

    /// Link `new` into the chain right after `id`
    fn link_after(&mut self, id: ChunkId, new: ChunkId) {
        let next = self.pool.next(id);
        self.pool.set_prev(new, Some(id));
        self.pool.set_next(new, next);
        match next {
            Some(next) => self.pool.set_prev(next, Some(new)),
            None => self.end = new,
        }
        self.pool.set_next(id, Some(new));
    }

    /// Unlink a non-head chunk. The chunk is not released.
    fn unlink(&mut self, id: ChunkId) {
        debug_assert_ne!(id, self.begin, "the head chunk is never unlinked");
        let prev = self.pool.prev(id);
        let next = self.pool.next(id);
        if let Some(prev) = prev {
            self.pool.set_next(prev, next);
        }
        match next {
            Some(next) => self.pool.set_prev(next, prev),
            None => {
                if let Some(prev) = prev {
                    self.end = prev;
                }
            }
        }
        self.pool.set_prev(id, None);
        self.pool.set_next(id, None);
    }

    /// Shift the bytes at and after `offset` right by one and store `byte`
    fn shift_insert(&mut self, id: ChunkId, offset: usize, byte: u8) {
        let len = self.pool.len(id);
        let storage = self.pool.storage_mut(id);
        storage.copy_within(offset..len, offset + 1);
        storage[offset] = byte;
        self.pool.set_len(id, len + 1);
    }

    /// Insert `byte` before `pos`, returning the position just after it
    ///
    /// On `OutOfMemory` the chain is left untouched.
    pub(crate) fn insert_byte(&mut self, pos: Position, byte: u8) -> Result<Position, BufferError> {
        let capacity = self.chunk_capacity();
        let mut chunk = pos.chunk;
        let mut offset = pos.offset;

        // "End of this chunk" and "start of the next" are the same place;
        // always insert at the latter.
        if offset == self.chunk_len(chunk) {
            if let Some(next) = self.next(chunk) {
                chunk = next;
                offset = 0;
            }
        }

        let len = self.chunk_len(chunk);
        let after = if len < capacity {
            self.shift_insert(chunk, offset, byte);
            Position {
                chunk,
                offset: offset + 1,
                abs: pos.abs + 1,
            }
        } else {
            let new = self.pool.allocate()?;
            self.link_after(chunk, new);

            if offset == capacity {
                self.pool.storage_mut(new)[0] = byte;
                self.pool.set_len(new, 1);
                tracing::trace!("appended chunk {:?} after full chunk {:?}", new, chunk);
                Position {
                    chunk: new,
                    offset: 1,
                    abs: pos.abs + 1,
                }
            } else {
                let tail = len - offset;
                self.pool.copy_between(chunk, offset, new, 0, tail);
                self.pool.set_len(new, tail);
                self.pool.set_len(chunk, offset);
                self.shift_insert(chunk, offset, byte);
                tracing::trace!(
                    "split chunk {:?} at {}, moved {} bytes to {:?}",
                    chunk,
                    offset,
                    tail,
                    new
                );
                Position {
                    chunk,
                    offset: offset + 1,
                    abs: pos.abs + 1,
                }
            }
        };

        self.size += 1;
        Ok(after)
    }

    /// Remove the byte at `pos` and return it
    ///
    /// `pos.offset` must be below the chunk's length. No cleanup happens
    /// here; call [`Self::cleanup_after_delete`] with the resulting cursor.
    pub(crate) fn remove_byte(&mut self, pos: Position) -> u8 {
        let len = self.pool.len(pos.chunk);
        debug_assert!(pos.offset < len, "remove past end of chunk");
        let storage = self.pool.storage_mut(pos.chunk);
        let byte = storage[pos.offset];
        storage.copy_within(pos.offset + 1..len, pos.offset);
        self.pool.set_len(pos.chunk, len - 1);
        self.size -= 1;
        byte
    }

    /// Tidy the chain around `cursor` after a removal
    ///
    /// 1. An emptied non-head chunk is unlinked and released; the cursor moves
    ///    to the end of the chunk before it.
    /// 2. The cursor's chunk absorbs its successor if both fit in one chunk.
    pub(crate) fn cleanup_after_delete(&mut self, cursor: Position) -> Cleanup {
        let mut cursor = cursor;
        let mut current = cursor.chunk;
        let mut emptied = None;
        let mut merged = None;

        if self.chunk_len(current) == 0 && current != self.begin {
            if let Some(prev) = self.prev(current) {
                self.unlink(current);
                self.pool.release(current);
                tracing::trace!("released emptied chunk {:?}", current);
                emptied = Some(current);
                cursor = Position {
                    chunk: prev,
                    offset: self.chunk_len(prev),
                    abs: cursor.abs,
                };
                current = prev;
            }
        }

        if let Some(next) = self.next(current) {
            let current_len = self.chunk_len(current);
            let next_len = self.chunk_len(next);
            if current_len + next_len <= self.chunk_capacity() {
                self.pool.copy_between(next, 0, current, current_len, next_len);
                self.pool.set_len(current, current_len + next_len);
                self.unlink(next);
                if cursor.chunk == next {
                    cursor = Position {
                        chunk: current,
                        offset: current_len + cursor.offset,
                        abs: cursor.abs,
                    };
                }
                self.pool.release(next);
                tracing::trace!("merged chunk {:?} into {:?}", next, current);
                merged = Some(next);
            }
        }

        Cleanup {
            cursor,
            emptied,
            merged,
        }
    }

    /// Drop all content, keeping only an empty head chunk
    pub(crate) fn reset(&mut self) {
        let mut id = self.next(self.begin);
        while let Some(chunk) = id {
            id = self.next(chunk);
            self.pool.release(chunk);
        }
        self.pool.set_next(self.begin, None);
        self.pool.set_len(self.begin, 0);
        self.end = self.begin;
        self.size = 0;
    }

    /// Return every chunk to the pool and hand the pool back
    pub fn into_pool(mut self) -> ChunkPool {
        let mut id = Some(self.begin);
        while let Some(chunk) = id {
            id = self.next(chunk);
            self.pool.release(chunk);
        }
        self.pool
    }

    /// Check the structural invariants, describing the first violation found
    pub fn validate(&self) -> Result<(), String> {
        if self.prev(self.begin).is_some() {
            return Err(format!("head chunk {:?} has a prev link", self.begin));
        }

        let mut prev = None;
        let mut last = self.begin;
        let mut total = 0;
        let mut count = 0;
        let mut id = Some(self.begin);

        while let Some(chunk) = id {
            count += 1;
            if count > self.pool.used_count() {
                return Err("chain is longer than the allocated chunk count".to_string());
            }
            if !self.is_live(chunk) {
                return Err(format!("chunk {:?} in chain is not allocated", chunk));
            }
            if self.prev(chunk) != prev {
                return Err(format!(
                    "chunk {:?} has prev {:?}, expected {:?}",
                    chunk,
                    self.prev(chunk),
                    prev
                ));
            }
            let len = self.chunk_len(chunk);
            if len == 0 && chunk != self.begin {
                return Err(format!("non-head chunk {:?} is empty", chunk));
            }
            total += len;
            prev = Some(chunk);
            last = chunk;
            id = self.next(chunk);
        }

        if last != self.end {
            return Err(format!("end is {:?} but last chunk is {:?}", self.end, last));
        }
        if total != self.size {
            return Err(format!("size is {} but chunks hold {}", self.size, total));
        }
        if count != self.pool.used_count() {
            return Err(format!(
                "{} chunks allocated but only {} linked",
                self.pool.used_count(),
                count
            ));
        }
        Ok(())
    }
}

/// Iterator over chunk ids in chain order
pub struct Chunks<'a> {
    chain: &'a ChunkChain,
    next: Option<ChunkId>,
}

impl Iterator for Chunks<'_> {
    type Item = ChunkId;

    fn next(&mut self) -> Option<ChunkId> {
        let id = self.next?;
        self.next = self.chain.next(id);
        Some(id)
    }
}
