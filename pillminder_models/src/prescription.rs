use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reminder::ReminderRule;

pub type PrescriptionId = i64;
pub type DrugId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    pub id: DrugId,
    pub name: String,
    pub dosage: String,
    #[serde(default)]
    pub reminder_enabled: bool,
    #[serde(default)]
    pub reminder_times: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: PrescriptionId,
    pub doctor: String,
    #[serde(rename = "date")]
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub drugs: Vec<Drug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl Prescription {
    /// One rule per drug, attributed to the prescribing doctor.
    pub fn reminder_rules(&self) -> impl Iterator<Item = ReminderRule> + '_ {
        self.drugs.iter().map(|drug| ReminderRule {
            drug_name: drug.name.clone(),
            dosage: drug.dosage.clone(),
            prescribing_doctor: self.doctor.clone(),
            times_of_day: drug.reminder_times.clone(),
            enabled: drug.reminder_enabled,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrug {
    pub name: String,
    pub dosage: String,
    pub reminder_enabled: bool,
    pub reminder_times: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrescription {
    pub doctor: String,
    pub issue_date: NaiveDate,
    pub drugs: Vec<NewDrug>,
    pub file_data: Option<String>,
    pub file_type: Option<String>,
}
