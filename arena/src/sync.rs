use {
    crate::{
        alloc::ArenaAlloc,
        buffer::Buffer,
        error::OutOfMemory,
        stack::{LeftMark, Stacks},
    },
    parking_lot::Mutex,
    std::ptr::NonNull,
};

/// Double-ended arena that serializes every operation behind a mutex.
///
/// Allocation calls may come from several threads at once,
/// e.g. background loaders taking scratch memory from the right side.
#[derive(Debug)]
pub struct SyncArena {
    name: Box<str>,
    buffer: Buffer,
    stacks: Mutex<Stacks>,
}

impl SyncArena {
    #[tracing::instrument]
    pub fn new(name: &str, capacity: usize) -> Result<Self, OutOfMemory> {
        let buffer = Buffer::new(capacity)?;
        tracing::info!("Arena created");
        Ok(SyncArena {
            name: name.into(),
            buffer,
            stacks: Mutex::new(Stacks::new(capacity)),
        })
    }

    /// Rolls the left side back to `mark`.
    ///
    /// # Panics
    ///
    /// Panics if `mark` is above current left stack top.
    pub fn free_left(&mut self, mark: LeftMark) {
        self.stacks.get_mut().free_left(mark)
    }

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

    pub fn clear(&mut self) {
        tracing::trace!(arena = %self.name, "Arena cleared");
        self.clear_left();
        self.clear_right();
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

impl ArenaAlloc for SyncArena {
    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    fn available(&self) -> usize {
        self.stacks.lock().available()
    }

    fn mark_left(&self) -> LeftMark {
        self.stacks.lock().mark_left()
    }

    fn alloc_left(&self, size: usize) -> Result<NonNull<u8>, OutOfMemory> {
        // Lock must be released before `exhausted` reads `available`.
        let result = self.stacks.lock().alloc_left(&self.buffer, size);
        result.map_err(|_| self.exhausted(size))
    }

    fn alloc_left_aligned(
        &self,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, OutOfMemory> {
        let result =
            self.stacks
                .lock()
                .alloc_left_aligned(&self.buffer, size, align);
        result.map_err(|_| self.exhausted(size))
    }

    fn alloc_right(&self, size: usize) -> Result<NonNull<u8>, OutOfMemory> {
        let result = self.stacks.lock().alloc_right(&self.buffer, size);
        result.map_err(|_| self.exhausted(size))
    }

    fn alloc_right_aligned(
        &self,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, OutOfMemory> {
        let result =
            self.stacks
                .lock()
                .alloc_right_aligned(&self.buffer, size, align);
        result.map_err(|_| self.exhausted(size))
    }

    unsafe fn free_right(&self, ptr: NonNull<u8>) {
        self.stacks.lock().free_right(&self.buffer, ptr)
    }

    unsafe fn free_right_aligned(&self, ptr: NonNull<u8>) {
        self.stacks.lock().free_right_aligned(&self.buffer, ptr)
    }
}

impl Drop for SyncArena {
    fn drop(&mut self) {
        tracing::info!(arena = %self.name, "Arena destroyed");
    }
}
