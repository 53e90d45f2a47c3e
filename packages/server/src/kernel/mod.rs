//! Kernel module - server infrastructure shared across domains.

pub mod stream_hub;

pub use stream_hub::{GridEvent, StreamHub};
