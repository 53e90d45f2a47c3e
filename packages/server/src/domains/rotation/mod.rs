//! Rotation domain - periodic in-page re-randomization of occupied squares
//!
//! ```text
//! RotationScheduler (timer | manual)
//!     │   one rotation at a time
//!     └─► RotationEngine::rotate(now)
//!             ├─► SquareStore::active_records(now)
//!             ├─► group by page, shuffle::plan_page per page
//!             ├─► SquareStore::apply_page_assignment (atomic per page)
//!             └─► StreamHub: rotation_completed
//! ```

pub mod engine;
pub mod errors;
pub mod scheduler;
pub mod shuffle;
pub mod stats;

pub use engine::{PageFailure, RotationEngine, RotationResult};
pub use errors::RotationError;
pub use scheduler::{RotationScheduler, Trigger, TriggerOutcome};
pub use stats::{RotationStats, StatsReporter};
