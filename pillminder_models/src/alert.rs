use serde::{Deserialize, Serialize};

use crate::reminder::ReminderRule;

/// Banner shown inside the application when a reminder fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InAppAlert {
    pub drug_name: String,
    pub dosage: String,
    pub doctor: String,
}

impl From<&ReminderRule> for InAppAlert {
    fn from(rule: &ReminderRule) -> Self {
        Self {
            drug_name: rule.drug_name.clone(),
            dosage: rule.dosage.clone(),
            doctor: rule.prescribing_doctor.clone(),
        }
    }
}
