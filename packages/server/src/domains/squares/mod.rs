//! Squares domain - purchase records and their lifecycle
//!
//! Architecture:
//!   HTTP → actions (validation) → SquareStore (memory or Postgres)
//!   Reads classify each record with `lifecycle::status` at read time.

pub mod actions;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use errors::{PurchaseError, StoreError};
pub use lifecycle::status;
pub use models::square::{AdPayload, PaymentStatus, SquareRecord, SquareStatus};
pub use store::{MemorySquareStore, PageAssignment, PostgresSquareStore, SquareMove, SquareStore, StoreStats};
