// Grid Squares - Rotation & Lifecycle Engine
//
// This crate owns the authoritative state of the advertising grid: which squares
// are occupied, when occupancy expires, and the periodic in-page rotation that
// keeps any single advertiser from holding a permanently better slot.
//
// Payment capture and rendering live elsewhere; they talk to this service over HTTP.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
