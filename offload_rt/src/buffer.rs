//! Slices of a [`crate::memory::MemoryMap`] consumed by task-adapter
//! operations. See `SPEC_FULL.md` section 3 ("Memory maps, buffer
//! inventories, and buffers").

/// A borrowed slice of a registered memory region.
///
/// Carries its own read/write capability so a read-only test vector
/// (`MemoryMap::from_static`) can still be handed to an operation that
/// only reads its input, while operations that need to write results get
/// a `ReadWrite` buffer from a mutable map or a [`crate::memory::BufferInventory`].
/// Tasks in `task_adapter/*` take `Buffer<'a>` (or `&[Buffer<'a>]` /
/// `&mut [Buffer<'a>]`) arguments; the borrow checker enforces the caller
/// contract from section 5 ("owners must outlive the task") because the
/// task's future cannot outlive the borrow.
#[derive(Debug)]
pub enum Buffer<'a> {
    ReadOnly(&'a [u8]),
    ReadWrite(&'a mut [u8]),
}

impl<'a> Buffer<'a> {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::ReadOnly(s) => s,
            Buffer::ReadWrite(s) => s,
        }
    }

    /// # Panics
    /// Panics if this buffer was borrowed read-only.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Buffer::ReadOnly(_) => panic!("buffer is read-only"),
            Buffer::ReadWrite(s) => s,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}
