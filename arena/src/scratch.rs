use {
    crate::{alloc::ArenaAlloc, error::OutOfMemory},
    std::{
        fmt::{self, Debug},
        marker::PhantomData,
        mem::{align_of, size_of},
        ops::{Deref, DerefMut},
        ptr::{self, NonNull},
        slice,
    },
};

/// Temporary slice on the right side of an arena.
/// Elements are dropped and the block is freed when the guard is dropped.
pub struct Scratch<'a, T, A: ArenaAlloc> {
    arena: &'a A,
    ptr: NonNull<T>,
    len: usize,
    marker: PhantomData<T>,
}

impl<'a, T, A> Scratch<'a, T, A>
where
    A: ArenaAlloc,
{
    pub(crate) fn new<F>(
        arena: &'a A,
        len: usize,
        mut f: F,
    ) -> Result<Self, OutOfMemory>
    where
        F: FnMut(usize) -> T,
    {
        let size = size_of::<T>().checked_mul(len).ok_or(OutOfMemory)?;
        let ptr: NonNull<T> = if size == 0 {
            NonNull::dangling()
        } else {
            arena.alloc_right_aligned(size, align_of::<T>())?.cast()
        };

        for index in 0..len {
            unsafe {
                // `index` is within allocated array.
                ptr.as_ptr().add(index).write(f(index));
            }
        }

        Ok(Scratch {
            arena,
            ptr,
            len,
            marker: PhantomData,
        })
    }

    fn is_allocated(&self) -> bool {
        size_of::<T>() != 0 && self.len != 0
    }
}

impl<T, A> Deref for Scratch<'_, T, A>
where
    A: ArenaAlloc,
{
    type Target = [T];

    fn deref(&self) -> &[T] {
        unsafe {
            // Initialized in `Scratch::new`.
            slice::from_raw_parts(self.ptr.as_ptr(), self.len)
        }
    }
}

impl<T, A> DerefMut for Scratch<'_, T, A>
where
    A: ArenaAlloc,
{
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe {
            // Initialized in `Scratch::new`.
            slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len)
        }
    }
}

impl<T, A> Drop for Scratch<'_, T, A>
where
    A: ArenaAlloc,
{
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.ptr.as_ptr(),
                self.len,
            ));

            if self.is_allocated() {
                // Block was allocated with `alloc_right_aligned`
                // and is owned by this guard.
                self.arena.free_right_aligned(self.ptr.cast());
            }
        }
    }
}

impl<T, A> Debug for Scratch<'_, T, A>
where
    T: Debug,
    A: ArenaAlloc,
{
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Scratch")
            .field("arena", &self.arena.name())
            .field("values", &&**self)
            .finish()
    }
}
