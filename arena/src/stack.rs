use {
    crate::{buffer::Buffer, error::OutOfMemory},
    std::{mem::size_of, ptr::NonNull},
};

/// Largest alignment supported by aligned allocations.
/// Adjustment must fit into the single byte preceding the block.
pub const MAX_ALIGN: usize = 128;

/// Hidden header placed right below every right side block.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
struct Header {
    size: usize,
    freed: bool,
}

pub(crate) const HEADER_SIZE: usize = size_of::<Header>();

/// Position of the left stack top.
/// Rolling back to a mark releases everything allocated after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeftMark(pub(crate) usize);

/// Bookkeeping of both stacks.
/// `left` grows up from zero, `right` grows down from the buffer end.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stacks {
    left: usize,
    right: usize,
}

impl Stacks {
    pub fn new(capacity: usize) -> Self {
        Stacks {
            left: 0,
            right: capacity,
        }
    }

    pub fn available(&self) -> usize {
        self.right - self.left
    }

    pub fn mark_left(&self) -> LeftMark {
        LeftMark(self.left)
    }

    pub fn alloc_left(
        &mut self,
        buffer: &Buffer,
        size: usize,
    ) -> Result<NonNull<u8>, OutOfMemory> {
        if size > self.available() {
            return Err(OutOfMemory);
        }
        let ptr = buffer.at(self.left);
        self.left += size;
        Ok(ptr)
    }

    pub fn alloc_left_aligned(
        &mut self,
        buffer: &Buffer,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, OutOfMemory> {
        check_align(align);
        let total = size.checked_add(align).ok_or(OutOfMemory)?;
        let base = self.alloc_left(buffer, total)?;
        Ok(unsafe {
            // `align` extra bytes were reserved.
            adjust(base, align)
        })
    }

    pub fn free_left(&mut self, mark: LeftMark) {
        assert!(
            mark.0 <= self.left,
            "Mark {} is above the left stack top {}",
            mark.0,
            self.left
        );
        self.left = mark.0;
    }

    /// # Safety
    ///
    /// `ptr` must be returned by `alloc_left_aligned` of the same buffer
    /// and must not be released by an earlier rollback.
    pub unsafe fn free_left_aligned(
        &mut self,
        buffer: &Buffer,
        ptr: NonNull<u8>,
    ) {
        let base = unadjust(ptr);
        self.free_left(LeftMark(buffer.offset_of(base)));
    }

    pub fn clear_left(&mut self) {
        self.left = 0;
    }

    pub fn alloc_right(
        &mut self,
        buffer: &Buffer,
        size: usize,
    ) -> Result<NonNull<u8>, OutOfMemory> {
        let total = size.checked_add(HEADER_SIZE).ok_or(OutOfMemory)?;
        if total > self.available() {
            return Err(OutOfMemory);
        }
        self.right -= total;
        unsafe {
            // Header fits between the new right mark and the block.
            write_header(
                buffer,
                self.right,
                Header {
                    size,
                    freed: false,
                },
            );
        }
        Ok(buffer.at(self.right + HEADER_SIZE))
    }

    pub fn alloc_right_aligned(
        &mut self,
        buffer: &Buffer,
        size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, OutOfMemory> {
        check_align(align);
        let total = size.checked_add(align).ok_or(OutOfMemory)?;
        let base = self.alloc_right(buffer, total)?;
        Ok(unsafe {
            // `align` extra bytes were reserved.
            adjust(base, align)
        })
    }

    /// Marks block as freed.
    /// If the block sits at the allocation boundary it is reclaimed
    /// together with every adjacent freed block above it.
    ///
    /// # Safety
    ///
    /// `ptr` must be returned by `alloc_right` of the same buffer
    /// and must not be freed already.
    pub unsafe fn free_right(&mut self, buffer: &Buffer, ptr: NonNull<u8>) {
        let offset = buffer.offset_of(ptr) - HEADER_SIZE;
        debug_assert!(offset >= self.right, "Block was already reclaimed");

        if offset != self.right {
            let mut header = read_header(buffer, offset);
            debug_assert!(!header.freed, "Block is freed twice");
            header.freed = true;
            write_header(buffer, offset, header);
            return;
        }

        loop {
            let header = read_header(buffer, self.right);
            self.right += HEADER_SIZE + header.size;
            if self.right == buffer.capacity()
                || !read_header(buffer, self.right).freed
            {
                break;
            }
        }
    }

    /// # Safety
    ///
    /// `ptr` must be returned by `alloc_right_aligned` of the same buffer
    /// and must not be freed already.
    pub unsafe fn free_right_aligned(
        &mut self,
        buffer: &Buffer,
        ptr: NonNull<u8>,
    ) {
        self.free_right(buffer, unadjust(ptr))
    }

    pub fn clear_right(&mut self, buffer: &Buffer) {
        self.right = buffer.capacity();
    }
}

fn check_align(align: usize) {
    assert!(
        align.is_power_of_two() && align <= MAX_ALIGN,
        "Alignment {} must be a power of two not greater than {}",
        align,
        MAX_ALIGN
    );
}

/// Moves `base` forward to the next `align`-aligned address,
/// always by at least one byte, and stores the distance right before it.
unsafe fn adjust(base: NonNull<u8>, align: usize) -> NonNull<u8> {
    let mask = align - 1;
    let adjustment = align - (base.as_ptr() as usize & mask);
    let ptr = base.as_ptr().add(adjustment);
    ptr.sub(1).write(adjustment as u8);
    NonNull::new_unchecked(ptr)
}

unsafe fn unadjust(ptr: NonNull<u8>) -> NonNull<u8> {
    let adjustment = ptr.as_ptr().sub(1).read() as usize;
    debug_assert!(adjustment >= 1 && adjustment <= MAX_ALIGN);
    NonNull::new_unchecked(ptr.as_ptr().sub(adjustment))
}

unsafe fn read_header(buffer: &Buffer, offset: usize) -> Header {
    buffer.at(offset).cast::<Header>().as_ptr().read_unaligned()
}

unsafe fn write_header(buffer: &Buffer, offset: usize, header: Header) {
    buffer
        .at(offset)
        .cast::<Header>()
        .as_ptr()
        .write_unaligned(header)
}
