//! Fixed-capacity double-ended stack allocator.
//!
//! One buffer is allocated up front and handed out from both ends.
//! The left side is a bump allocator. It is rolled back to a previously
//! taken mark, releasing every allocation made after that mark at once.
//! The right side is a stack of blocks with a small hidden header.
//! Those blocks may be freed in any order, and their space is reclaimed
//! once the freed blocks reach the allocation boundary.
//!
//! [`Arena`] has no locking and must stay on one thread.
//! [`SyncArena`] puts the same bookkeeping behind a mutex.

mod alloc;
mod buffer;
mod error;
mod local;
mod pool;
mod scratch;
mod stack;
mod sync;

pub use self::{
    alloc::ArenaAlloc,
    error::*,
    local::Arena,
    pool::{Pool, PoolKey},
    scratch::Scratch,
    stack::{LeftMark, MAX_ALIGN},
    sync::SyncArena,
};

/// Size of the hidden header preceding each right side block.
pub const RIGHT_HEADER_SIZE: usize = stack::HEADER_SIZE;
