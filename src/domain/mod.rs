//! Domain layer - Core inventory types and port definitions
//!
//! This module defines the types the aggregation core works on and the
//! trait (port) that API adapters implement.

pub mod ports;

pub use ports::*;
