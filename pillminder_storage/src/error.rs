use std::time::Duration;

use pillminder_models::prescription::PrescriptionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Could not access local prescription cache: {0}")]
    Io(#[from] std::io::Error),

    #[error("Local prescription cache is corrupted: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prescription store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("No such prescription {0}")]
    NotFound(PrescriptionId),
}
