//! Command implementations.

pub mod config;
pub mod pack;
pub mod unpack;
pub mod verify;

mod progress;
