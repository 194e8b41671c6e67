use std::collections::HashMap;

use pillminder_models::{
    chrono::NaiveDate,
    prescription::{Drug, DrugId, Prescription, PrescriptionId},
};

#[derive(sqlx::FromRow)]
pub struct PrescriptionStorageModel {
    pub id: i64,
    pub prescribing_doctor: String,
    pub issue_date: NaiveDate,
    pub file_data: Option<String>,
    pub file_type: Option<String>,
}

#[derive(sqlx::FromRow)]
pub struct DrugStorageModel {
    pub id: i64,
    pub prescription_id: i64,
    pub drug_name: String,
    pub dosage: String,
    pub reminder_enabled: bool,
}

#[derive(sqlx::FromRow)]
pub struct ReminderTimeStorageModel {
    pub drug_id: i64,
    pub reminder_time: String,
}

/// Stitches the three tables back into prescriptions, keeping the order of
/// `prescriptions` and the row order of drugs and times.
pub fn assemble(
    prescriptions: Vec<PrescriptionStorageModel>,
    drugs: Vec<DrugStorageModel>,
    times: Vec<ReminderTimeStorageModel>,
) -> Vec<Prescription> {
    let mut times_by_drug: HashMap<DrugId, Vec<String>> = HashMap::new();
    for time in times {
        times_by_drug
            .entry(time.drug_id)
            .or_default()
            .push(time.reminder_time);
    }

    let mut drugs_by_prescription: HashMap<PrescriptionId, Vec<Drug>> = HashMap::new();
    for drug in drugs {
        let reminder_times = times_by_drug.remove(&drug.id).unwrap_or_default();
        drugs_by_prescription
            .entry(drug.prescription_id)
            .or_default()
            .push(Drug {
                id: drug.id,
                name: drug.drug_name,
                dosage: drug.dosage,
                reminder_enabled: drug.reminder_enabled,
                reminder_times,
            });
    }

    prescriptions
        .into_iter()
        .map(|p| Prescription {
            drugs: drugs_by_prescription.remove(&p.id).unwrap_or_default(),
            id: p.id,
            doctor: p.prescribing_doctor,
            issue_date: p.issue_date,
            file_data: p.file_data,
            file_type: p.file_type,
        })
        .collect()
}
