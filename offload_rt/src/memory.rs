//! Memory maps and buffer inventories.
//!
//! Named in spec.md section 1's data model ("Memory maps, buffer
//! inventories, and buffers describing registered memory regions and
//! slices thereof") but never detailed in a [MODULE] block of the
//! distilled spec — filled in here from `original_source/doca/common/raw_memory.hpp`
//! and the buffer usage in `original_source/samples/erasure_encode.cpp` /
//! `original_source/progs/dma_client.cpp`.

use crate::buffer::Buffer;

/// A registered region of host memory.
///
/// Dropped only after every [`Buffer`] derived from it has been dropped —
/// enforced at compile time, the same way `r3bl_terminal_async`'s
/// `SharedWriter` lifetime is tied to its owning `Readline` by ordinary
/// borrowing rather than a runtime check.
#[derive(Debug)]
pub struct MemoryMap {
    storage: Storage,
}

#[derive(Debug)]
enum Storage {
    Owned(Vec<u8>),
    Static(&'static [u8]),
}

impl MemoryMap {
    /// Register a freshly allocated, zero-initialized region of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self { storage: Storage::Owned(vec![0u8; len]) }
    }

    /// Register an owned buffer directly (no extra copy).
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { storage: Storage::Owned(data) }
    }

    /// Wrap a `&'static` constant buffer — useful for read-only test
    /// vectors that never need mutation.
    pub fn from_static(data: &'static [u8]) -> Self {
        Self { storage: Storage::Static(data) }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Owned(v) => v.len(),
            Storage::Static(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the whole map read-only.
    pub fn whole(&self) -> Buffer<'_> {
        Buffer::ReadOnly(match &self.storage {
            Storage::Owned(v) => v.as_slice(),
            Storage::Static(s) => s,
        })
    }

    /// Borrow the whole map read-write.
    ///
    /// # Panics
    /// Panics if this map was constructed via [`MemoryMap::from_static`].
    pub fn whole_mut(&mut self) -> Buffer<'_> {
        match &mut self.storage {
            Storage::Owned(v) => Buffer::ReadWrite(v.as_mut_slice()),
            Storage::Static(_) => panic!("cannot mutably borrow a static memory map"),
        }
    }
}

/// A free-list of equally sized buffer slots carved out of one
/// [`MemoryMap`]. Used by erasure coding (one slot per data/redundancy
/// block) and DMA chaining. `alloc`/`free` never touch the native
/// library — pure slicing of the backing map, computed once up front.
#[derive(Debug)]
pub struct BufferInventory<'a> {
    slot_len: usize,
    free_slots: Vec<&'a mut [u8]>,
}

impl<'a> BufferInventory<'a> {
    pub fn new(map: &'a mut MemoryMap, slot_len: usize) -> Self {
        assert!(slot_len > 0, "slot_len must be non-zero");
        let Storage::Owned(data) = &mut map.storage else {
            panic!("cannot carve a buffer inventory out of a static memory map");
        };
        let mut slots: Vec<&'a mut [u8]> = data
            .chunks_mut(slot_len)
            .filter(|chunk| chunk.len() == slot_len)
            .collect();
        slots.reverse(); // so `pop()` hands out slots front-to-back.
        Self { slot_len, free_slots: slots }
    }

    pub fn capacity(&self) -> usize {
        self.free_slots.len()
    }

    pub fn slot_len(&self) -> usize {
        self.slot_len
    }

    pub fn alloc(&mut self) -> Option<Buffer<'a>> {
        self.free_slots.pop().map(Buffer::ReadWrite)
    }

    pub fn free(&mut self, buf: Buffer<'a>) {
        if let Buffer::ReadWrite(slice) = buf {
            debug_assert_eq!(slice.len(), self.slot_len);
            self.free_slots.push(slice);
        }
    }
}
