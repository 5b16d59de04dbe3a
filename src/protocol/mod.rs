//! ENet protocol primitives, commands, and related state.
//!
//! This module houses constants, command definitions, encoding helpers and
//! connection state used by the higher–level session and transport layers.

pub mod constants;
pub mod packet;
pub mod state;
pub mod types;
