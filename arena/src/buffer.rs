use {
    crate::error::OutOfMemory,
    std::{
        alloc::{alloc, dealloc, Layout},
        ptr::NonNull,
    },
};

/// Alignment of the arena's backing buffer.
pub(crate) const BUFFER_ALIGN: usize = 16;

/// Fixed-size byte buffer taken from the global allocator once.
#[derive(Debug)]
pub(crate) struct Buffer {
    ptr: NonNull<u8>,
    capacity: usize,
}

unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl Buffer {
    pub fn new(capacity: usize) -> Result<Self, OutOfMemory> {
        if capacity == 0 {
            return Ok(Buffer {
                ptr: NonNull::dangling(),
                capacity,
            });
        }

        let layout = Layout::from_size_align(capacity, BUFFER_ALIGN)
            .map_err(|_| OutOfMemory)?;

        let ptr = unsafe {
            // Layout size is non-zero.
            alloc(layout)
        };

        match NonNull::new(ptr) {
            Some(ptr) => Ok(Buffer { ptr, capacity }),
            None => {
                tracing::error!(
                    "Failed to allocate {} bytes for arena buffer",
                    capacity
                );
                Err(OutOfMemory)
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns pointer to the byte at `offset`.
    /// `offset == capacity` yields the one-past-the-end pointer.
    pub fn at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= self.capacity);
        unsafe {
            // Offset is within the buffer or one past its end.
            NonNull::new_unchecked(self.ptr.as_ptr().add(offset))
        }
    }

    /// Returns offset of `ptr` from the buffer start.
    pub fn offset_of(&self, ptr: NonNull<u8>) -> usize {
        debug_assert!(self.contains(ptr), "Pointer is not from this arena");
        ptr.as_ptr() as usize - self.ptr.as_ptr() as usize
    }

    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        let start = self.ptr.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        addr >= start && addr <= start + self.capacity
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.capacity != 0 {
            unsafe {
                // Same layout was used in `Buffer::new`.
                dealloc(
                    self.ptr.as_ptr(),
                    Layout::from_size_align_unchecked(
                        self.capacity,
                        BUFFER_ALIGN,
                    ),
                )
            }
        }
    }
}
