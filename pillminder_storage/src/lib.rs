mod error;
mod local;
mod prescription;
mod session;
pub mod sqlite;

pub use error::StoreError;
pub use local::LocalPrescriptionCache;
pub use prescription::PrescriptionStore;
pub use session::SessionPrescriptionStore;
pub use sqlite::prescription_storage::SqlitePrescriptionStore;
