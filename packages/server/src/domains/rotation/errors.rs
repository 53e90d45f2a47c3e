use thiserror::Error;

use crate::domains::squares::StoreError;

#[derive(Error, Debug)]
pub enum RotationError {
    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Rotation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
