use {
    crate::{error::OutOfMemory, scratch::Scratch, stack::LeftMark},
    std::{
        mem::{align_of, size_of},
        ptr::NonNull,
        slice,
    },
};

/// Allocation interface shared by [`Arena`] and [`SyncArena`].
///
/// Left side allocations live until the arena is rolled back past them.
/// Values placed on the left side are never dropped.
///
/// [`Arena`]: crate::Arena
/// [`SyncArena`]: crate::SyncArena
pub trait ArenaAlloc {
    /// Name used in log records.
    fn name(&self) -> &str;

    fn capacity(&self) -> usize;

    /// Bytes left between the two stacks.
    fn available(&self) -> usize;

    fn mark_left(&self) -> LeftMark;

    fn alloc_left(&self, size: usize) -> Result<NonNull<u8>, OutOfMemory>;

    /// Allocates `size` bytes aligned to `align` from the left side.
    /// Reserves `size + align` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two or exceeds [`MAX_ALIGN`].
    ///
    /// [`MAX_ALIGN`]: crate::MAX_ALIGN
    fn alloc_left_aligned(
        &self,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, OutOfMemory>;

    fn alloc_right(&self, size: usize) -> Result<NonNull<u8>, OutOfMemory>;

    /// Right side counterpart of `alloc_left_aligned`.
    fn alloc_right_aligned(
        &self,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, OutOfMemory>;

    /// Frees right side block.
    /// Blocks may be freed in any order. Space is reclaimed once
    /// the freed blocks reach the allocation boundary.
    ///
    /// # Safety
    ///
    /// `ptr` must be returned by `alloc_right` of this arena,
    /// must not be freed twice and must not be accessed afterwards.
    unsafe fn free_right(&self, ptr: NonNull<u8>);

    /// # Safety
    ///
    /// `ptr` must be returned by `alloc_right_aligned` of this arena,
    /// must not be freed twice and must not be accessed afterwards.
    unsafe fn free_right_aligned(&self, ptr: NonNull<u8>);

    fn alloc_left_value<T>(&self, value: T) -> Result<&mut T, OutOfMemory> {
        let ptr = left_array::<Self, T>(self, 1)?;
        unsafe {
            // Freshly allocated and properly aligned.
            ptr.as_ptr().write(value);
            Ok(&mut *ptr.as_ptr())
        }
    }

    /// Allocates slice on the left side and fills it with values
    /// produced by `f`. Stops at the first error.
    fn try_alloc_slice_left_with<T, E, F>(
        &self,
        len: usize,
        mut f: F,
    ) -> Result<&mut [T], E>
    where
        E: From<OutOfMemory>,
        F: FnMut(usize) -> Result<T, E>,
    {
        let ptr = left_array::<Self, T>(self, len)?;
        for index in 0..len {
            let value = f(index)?;
            unsafe {
                // `index` is within allocated array.
                ptr.as_ptr().add(index).write(value);
            }
        }
        Ok(unsafe {
            // All `len` elements are initialized.
            slice::from_raw_parts_mut(ptr.as_ptr(), len)
        })
    }

    fn alloc_slice_left_with<T, F>(
        &self,
        len: usize,
        mut f: F,
    ) -> Result<&mut [T], OutOfMemory>
    where
        F: FnMut(usize) -> T,
    {
        self.try_alloc_slice_left_with(len, |index| {
            Ok::<_, OutOfMemory>(f(index))
        })
    }

    fn alloc_slice_left_copy<T>(
        &self,
        src: &[T],
    ) -> Result<&mut [T], OutOfMemory>
    where
        T: Copy,
    {
        self.alloc_slice_left_with(src.len(), |index| src[index])
    }

    /// Allocates temporary slice on the right side.
    /// Returned guard frees it on drop.
    fn scratch<T, F>(
        &self,
        len: usize,
        f: F,
    ) -> Result<Scratch<'_, T, Self>, OutOfMemory>
    where
        Self: Sized,
        F: FnMut(usize) -> T,
    {
        Scratch::new(self, len, f)
    }
}

/// Allocates uninitialized array of `len` values of `T`.
/// Zero-sized requests do not touch the arena.
fn left_array<A, T>(arena: &A, len: usize) -> Result<NonNull<T>, OutOfMemory>
where
    A: ArenaAlloc + ?Sized,
{
    let size = size_of::<T>().checked_mul(len).ok_or(OutOfMemory)?;
    if size == 0 {
        return Ok(NonNull::dangling());
    }
    Ok(arena.alloc_left_aligned(size, align_of::<T>())?.cast())
}
