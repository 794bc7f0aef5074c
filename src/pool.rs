//! Fixed-capacity chunk pool.
//!
//! All chunk storage lives in one preallocated byte arena split into
//! `chunk_count` slots of `chunk_capacity` bytes. Free slots are threaded
//! through their own `next` link, so allocation and release are O(1).
//! Allocated slots reuse the same `prev`/`next` fields as chain links;
//! see [`crate::chain::ChunkChain`].
//!
//! Links are slot indices rather than pointers, so a released chunk can never
//! be reached through a dangling reference, only through a stale index, which
//! debug builds catch with the `live` flag.

use crate::error::BufferError;

/// Index of a chunk slot in its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(u32);

impl ChunkId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    len: usize,
    prev: Option<ChunkId>,
    next: Option<ChunkId>,
    live: bool,
}

/// Preallocated arena of fixed-size chunks
#[derive(Debug)]
pub struct ChunkPool {
    data: Vec<u8>,
    slots: Vec<Slot>,
    free_head: Option<ChunkId>,
    chunk_capacity: usize,
    used: usize,
}

impl ChunkPool {
    /// Create a pool of `chunk_count` chunks of `chunk_capacity` bytes each
    ///
    /// Zero sizes, more chunks than a `ChunkId` can address, and arenas whose
    /// byte size overflows are rejected with `InvalidConfig`.
    pub fn new(chunk_capacity: usize, chunk_count: usize) -> Result<Self, BufferError> {
        if chunk_capacity == 0 {
            return Err(BufferError::InvalidConfig(
                "chunk_capacity must be greater than 0".to_string(),
            ));
        }
        if chunk_count == 0 {
            return Err(BufferError::InvalidConfig(
                "chunk_count must be greater than 0".to_string(),
            ));
        }
        if chunk_count > u32::MAX as usize {
            return Err(BufferError::InvalidConfig(format!(
                "chunk_count {} exceeds {}",
                chunk_count,
                u32::MAX
            )));
        }
        let arena_len = chunk_capacity.checked_mul(chunk_count).ok_or_else(|| {
            BufferError::InvalidConfig(format!(
                "{} chunks of {} bytes overflow the address space",
                chunk_count, chunk_capacity
            ))
        })?;

        let mut slots = vec![Slot::default(); chunk_count];
        for (i, slot) in slots.iter_mut().enumerate().take(chunk_count - 1) {
            slot.next = Some(ChunkId(i as u32 + 1));
        }

        Ok(Self {
            data: vec![0; arena_len],
            slots,
            free_head: Some(ChunkId(0)),
            chunk_capacity,
            used: 0,
        })
    }

    /// Take a chunk off the free list
    ///
    /// The chunk comes back unlinked with size 0; its bytes are whatever the
    /// previous owner left there.
    pub fn allocate(&mut self) -> Result<ChunkId, BufferError> {
        let Some(id) = self.free_head else {
            tracing::warn!("chunk pool exhausted ({} chunks in use)", self.used);
            return Err(BufferError::OutOfMemory);
        };

        let slot = &mut self.slots[id.index()];
        debug_assert!(!slot.live, "free list contains live chunk {:?}", id);
        self.free_head = slot.next;
        *slot = Slot {
            live: true,
            ..Slot::default()
        };
        self.used += 1;
        Ok(id)
    }

    /// Return a chunk to the free list
    ///
    /// The caller must own `id` and must not use it afterwards.
    pub fn release(&mut self, id: ChunkId) {
        let slot = &mut self.slots[id.index()];
        debug_assert!(slot.live, "double release of chunk {:?}", id);
        slot.live = false;
        slot.len = 0;
        slot.prev = None;
        slot.next = self.free_head;
        self.free_head = Some(id);
        self.used -= 1;
    }

    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Total number of chunks, free or not
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn used_count(&self) -> usize {
        self.used
    }

    pub fn free_count(&self) -> usize {
        self.slots.len() - self.used
    }

    /// Is `id` currently allocated?
    pub fn is_live(&self, id: ChunkId) -> bool {
        self.slots.get(id.index()).is_some_and(|slot| slot.live)
    }

    pub(crate) fn len(&self, id: ChunkId) -> usize {
        self.slots[id.index()].len
    }

    pub(crate) fn set_len(&mut self, id: ChunkId, len: usize) {
        debug_assert!(len <= self.chunk_capacity);
        self.slots[id.index()].len = len;
    }

    pub(crate) fn prev(&self, id: ChunkId) -> Option<ChunkId> {
        self.slots[id.index()].prev
    }

    pub(crate) fn next(&self, id: ChunkId) -> Option<ChunkId> {
        self.slots[id.index()].next
    }

    pub(crate) fn set_prev(&mut self, id: ChunkId, prev: Option<ChunkId>) {
        self.slots[id.index()].prev = prev;
    }

    pub(crate) fn set_next(&mut self, id: ChunkId, next: Option<ChunkId>) {
        self.slots[id.index()].next = next;
    }

    /// The used bytes of a chunk
    pub(crate) fn bytes(&self, id: ChunkId) -> &[u8] {
        let start = id.index() * self.chunk_capacity;
        &self.data[start..start + self.len(id)]
    }

    /// The whole backing storage of a chunk, used or not
    pub(crate) fn storage_mut(&mut self, id: ChunkId) -> &mut [u8] {
        let start = id.index() * self.chunk_capacity;
        &mut self.data[start..start + self.chunk_capacity]
    }

    /// Copy `len` bytes starting at `from_offset` in `from` to the start of `to`
    pub(crate) fn copy_between(
        &mut self,
        from: ChunkId,
        from_offset: usize,
        to: ChunkId,
        to_offset: usize,
        len: usize,
    ) {
        let cap = self.chunk_capacity;
        let src = from.index() * cap + from_offset;
        let dst = to.index() * cap + to_offset;
        debug_assert!(from_offset + len <= cap && to_offset + len <= cap);
        self.data.copy_within(src..src + len, dst);
    }
}
