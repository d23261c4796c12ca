//! Domain logic
//!
//! - `traces` - Trace source adapter, flattener, and sync facade

pub mod traces;
