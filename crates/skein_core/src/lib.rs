//! # SKEIN Core
//!
//! Allocation primitives for the skeletal batch packing pipeline:
//! - Generation-tagged arenas, so identity checks are an integer compare
//! - Reset-on-return object pools for per-frame packing units
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in the warm frame path** - pools and arenas reuse slots
//! 2. **Handles, not references** - identity survives across frames without borrows
//! 3. **Explicit reset** - pooled objects drop every back-reference on return
//!
//! ## Example
//!
//! ```rust
//! use skein_core::Arena;
//!
//! let mut arena = Arena::new();
//! let a = arena.insert("region");
//! let b = arena.insert("mesh");
//! assert_ne!(a, b);
//! assert_eq!(arena.get(a), Some(&"region"));
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod memory;

pub use memory::{Arena, Handle, ObjectPool, Poolable};
