//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the runtime.
//! In particular, it exposes a [`Slab`] used to store spawned futures under
//! small reusable indices.

mod slab;

pub(crate) use slab::Slab;
