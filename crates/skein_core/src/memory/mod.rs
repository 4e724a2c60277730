//! # Memory Management
//!
//! Reusable storage for the frame loop.
//!
//! ## Design Philosophy
//!
//! Storage grows while a skeleton is warming up and is then reused:
//! - Arena slots are recycled with a bumped generation
//! - Pooled objects are reset and pushed back on a free list
//! - Nothing is freed until the owner is torn down

mod arena;
mod pool;

pub use arena::{Arena, Handle};
pub use pool::{ObjectPool, Poolable};
