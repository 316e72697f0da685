use {
    crate::{
        alloc::ArenaAlloc,
        buffer::Buffer,
        error::OutOfMemory,
        stack::{LeftMark, Stacks},
    },
    std::{cell::Cell, ptr::NonNull},
};

/// Double-ended arena without any locking.
///
/// Meant for single-threaded work such as synchronous model loading.
/// The type is `!Sync` so it cannot be shared between threads.
#[derive(Debug)]
pub struct Arena {
    name: Box<str>,
    buffer: Buffer,
    stacks: Cell<Stacks>,
}

impl Arena {
    #[tracing::instrument]
    pub fn new(name: &str, capacity: usize) -> Result<Self, OutOfMemory> {
        let buffer = Buffer::new(capacity)?;
        tracing::info!("Arena created");
        Ok(Arena {
            name: name.into(),
            buffer,
            stacks: Cell::new(Stacks::new(capacity)),
        })
    }

    /// Rolls the left side back to `mark`.
    /// Everything allocated on the left side after `mark` is released.
    ///
    /// # Panics
    ///
    /// Panics if `mark` is above current left stack top.
    pub fn free_left(&mut self, mark: LeftMark) {
        self.stacks.get_mut().free_left(mark)
    }

    /// Rolls the left side back to the start of the aligned block.
    ///
    /// # Safety
    ///
    /// `ptr` must be returned by `alloc_left_aligned` of this arena
    /// and must not be released by an earlier rollback.
    pub unsafe fn free_left_aligned(&mut self, ptr: NonNull<u8>) {
        self.stacks.get_mut().free_left_aligned(&self.buffer, ptr)
    }

    pub fn clear_left(&mut self) {
        self.stacks.get_mut().clear_left()
    }

    pub fn clear_right(&mut self) {
        self.stacks.get_mut().clear_right(&self.buffer)
    }

    /// Discards every allocation on both sides.
    pub fn clear(&mut self) {
        tracing::trace!(arena = %self.name, "Arena cleared");
        self.clear_left();
        self.clear_right();
    }

    fn update<R>(&self, f: impl FnOnce(&mut Stacks) -> R) -> R {
        let mut stacks = self.stacks.get();
        let result = f(&mut stacks);
        self.stacks.set(stacks);
        result
    }

    fn exhausted(&self, size: usize) -> OutOfMemory {
        tracing::warn!(
            arena = %self.name,
            size,
            available = self.available(),
            "Arena exhausted"
        );
        OutOfMemory
    }
}

impl ArenaAlloc for Arena {
    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    fn available(&self) -> usize {
        self.stacks.get().available()
    }

    fn mark_left(&self) -> LeftMark {
        self.stacks.get().mark_left()
    }

    fn alloc_left(&self, size: usize) -> Result<NonNull<u8>, OutOfMemory> {
        self.update(|stacks| stacks.alloc_left(&self.buffer, size))
            .map_err(|_| self.exhausted(size))
    }

    fn alloc_left_aligned(
        &self,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, OutOfMemory> {
        self.update(|stacks| stacks.alloc_left_aligned(&self.buffer, size, align))
            .map_err(|_| self.exhausted(size))
    }

    fn alloc_right(&self, size: usize) -> Result<NonNull<u8>, OutOfMemory> {
        self.update(|stacks| stacks.alloc_right(&self.buffer, size))
            .map_err(|_| self.exhausted(size))
    }

    fn alloc_right_aligned(
        &self,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, OutOfMemory> {
        self.update(|stacks| {
            stacks.alloc_right_aligned(&self.buffer, size, align)
        })
        .map_err(|_| self.exhausted(size))
    }

    unsafe fn free_right(&self, ptr: NonNull<u8>) {
        self.update(|stacks| stacks.free_right(&self.buffer, ptr))
    }

    unsafe fn free_right_aligned(&self, ptr: NonNull<u8>) {
        self.update(|stacks| stacks.free_right_aligned(&self.buffer, ptr))
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        tracing::info!(arena = %self.name, "Arena destroyed");
    }
}
