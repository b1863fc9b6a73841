//! # Workflows Module
//!
//! High-level drivers that chain link operators into complete growth moves.
//!
//! - **Chain Regrowth** ([`regrow`]) - Grows or retraces the tail of an unbranched
//!   molecule one atom at a time, accumulating weight and energy.

pub mod regrow;
