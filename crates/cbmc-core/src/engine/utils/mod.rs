//! Utility functions for the engine module.
//!
//! Currently the random source shared by every sampling stage and the
//! weighted selection it performs.

pub mod sampling;
