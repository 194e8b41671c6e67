pub mod alert;
pub mod permission;
pub mod prescription;
pub mod reminder;
pub mod user;

pub use chrono;
pub use chrono_tz;
