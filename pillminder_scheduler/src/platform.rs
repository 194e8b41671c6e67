use async_trait::async_trait;
use pillminder_models::{permission::PermissionStatus, reminder::ReminderRule};

/// Permission-gated native notification capability of the host platform.
#[async_trait]
pub trait NotificationPlatform: Send + Sync + 'static {
    fn permission_status(&self) -> PermissionStatus;

    async fn request_permission(&self) -> anyhow::Result<PermissionStatus>;

    async fn show_notification(&self, title: &str, body: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTemplate {
    pub title: String,
    /// `{drug}` is replaced with `"<name> (<dosage>)"`.
    pub body: String,
}

impl NotificationTemplate {
    pub fn render(&self, rule: &ReminderRule) -> (String, String) {
        let drug = format!("{} ({})", rule.drug_name, rule.dosage);
        (self.title.clone(), self.body.replace("{drug}", &drug))
    }
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self {
            title: "Medication Reminder".to_owned(),
            body: "Time to take your {drug}.".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_names_drug_and_dosage() {
        let rule = ReminderRule {
            drug_name: "Metformin".to_owned(),
            dosage: "500mg".to_owned(),
            prescribing_doctor: "Dr. Rahman".to_owned(),
            times_of_day: vec!["08:00".to_owned()],
            enabled: true,
        };

        let (title, body) = NotificationTemplate::default().render(&rule);

        assert_eq!(title, "Medication Reminder");
        assert_eq!(body, "Time to take your Metformin (500mg).");
    }
}
