use thiserror::Error;
use uuid::Uuid;

/// Errors raised by square persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Square record not found: {0}")]
    NotFound(Uuid),

    #[error("Square {0} is already occupied")]
    SquareOccupied(u32),

    #[error("Square {0} is outside the grid")]
    OutOfRange(u32),

    #[error("Record {0} is not awaiting payment")]
    NotPending(Uuid),

    #[error("Occupancy of page {page} changed since it was read")]
    OccupancyChanged { page: u32 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Errors raised while registering or settling a purchase.
#[derive(Error, Debug)]
pub enum PurchaseError {
    #[error("Square {0} is outside the grid")]
    InvalidSquare(u32),

    #[error("Purchase duration must be positive")]
    InvalidDuration,

    #[error("Purchase would already have expired at {0}")]
    AlreadyExpired(chrono::DateTime<chrono::Utc>),

    #[error(transparent)]
    Store(#[from] StoreError),
}
