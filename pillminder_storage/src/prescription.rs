use async_trait::async_trait;
use pillminder_models::{reminder::ReminderRule, user::OwnerId};

use crate::StoreError;

/// Source of reminder rules for the scheduler.
#[async_trait]
pub trait PrescriptionStore: Send + Sync + 'static {
    /// Every reminder rule of `owner`, or of the local source when `owner`
    /// is `None`. Implementations fail instead of hanging.
    async fn fetch_active_reminder_rules(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<ReminderRule>, StoreError>;
}
