pub mod clock;
pub mod platform;
mod scheduler;
pub mod target;

pub use clock::{Clock, ReminderTimeZone, SystemClock};
pub use platform::{NotificationPlatform, NotificationTemplate};
pub use scheduler::{ReminderScheduler, SchedulerOptions};
