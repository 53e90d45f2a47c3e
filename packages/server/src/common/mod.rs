// Common types and utilities shared across the application

pub mod layout;
pub mod types;

pub use layout::GridLayout;
pub use types::*;
