use std::{
    io::ErrorKind,
    path::PathBuf,
};

use async_trait::async_trait;
use pillminder_models::{
    prescription::{Drug, NewPrescription, Prescription, PrescriptionId},
    reminder::ReminderRule,
    user::OwnerId,
};
use tokio::sync::Mutex;

use crate::{PrescriptionStore, StoreError};

/// Prescriptions kept in a JSON file for use without a signed-in owner.
pub struct LocalPrescriptionCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalPrescriptionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// A missing file is an empty cache.
    pub async fn load(&self) -> Result<Vec<Prescription>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn add_prescription(
        &self,
        prescription: NewPrescription,
    ) -> Result<Prescription, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut prescriptions = self.load().await?;

        let next_id = prescriptions.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let mut next_drug_id = prescriptions
            .iter()
            .flat_map(|p| p.drugs.iter().map(|d| d.id))
            .max()
            .unwrap_or(0)
            + 1;

        let drugs = prescription
            .drugs
            .into_iter()
            .map(|drug| {
                let id = next_drug_id;
                next_drug_id += 1;
                Drug {
                    id,
                    name: drug.name,
                    dosage: drug.dosage,
                    reminder_enabled: drug.reminder_enabled,
                    reminder_times: drug.reminder_times,
                }
            })
            .collect();

        let created = Prescription {
            id: next_id,
            doctor: prescription.doctor,
            issue_date: prescription.issue_date,
            drugs,
            file_data: prescription.file_data,
            file_type: prescription.file_type,
        };

        prescriptions.insert(0, created.clone());
        self.save(&prescriptions).await?;

        Ok(created)
    }

    pub async fn delete_prescription(&self, id: PrescriptionId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut prescriptions = self.load().await?;

        let before = prescriptions.len();
        prescriptions.retain(|p| p.id != id);
        if prescriptions.len() == before {
            return Err(StoreError::NotFound(id));
        }

        self.save(&prescriptions).await
    }

    async fn save(&self, prescriptions: &[Prescription]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(prescriptions)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl PrescriptionStore for LocalPrescriptionCache {
    async fn fetch_active_reminder_rules(
        &self,
        _owner: Option<&OwnerId>,
    ) -> Result<Vec<ReminderRule>, StoreError> {
        let prescriptions = self.load().await?;

        Ok(prescriptions
            .iter()
            .flat_map(|p| p.reminder_rules())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pillminder_models::{chrono::NaiveDate, prescription::NewDrug};

    use super::*;

    fn new_prescription(doctor: &str) -> NewPrescription {
        NewPrescription {
            doctor: doctor.to_owned(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            drugs: vec![NewDrug {
                name: "Omeprazole".to_owned(),
                dosage: "20mg".to_owned(),
                reminder_enabled: true,
                reminder_times: vec!["07:30".to_owned()],
            }],
            file_data: None,
            file_type: None,
        }
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalPrescriptionCache::new(dir.path().join("prescriptions.json"));

        assert!(cache.load().await.unwrap().is_empty());
        assert!(cache.fetch_active_reminder_rules(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn added_prescriptions_survive_reload_and_get_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prescriptions.json");
        let cache = LocalPrescriptionCache::new(&path);

        let first = cache.add_prescription(new_prescription("Dr. A")).await.unwrap();
        let second = cache.add_prescription(new_prescription("Dr. B")).await.unwrap();

        let reloaded = LocalPrescriptionCache::new(&path).load().await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0], second);
        assert_ne!(first.id, second.id);
        assert_ne!(first.drugs[0].id, second.drugs[0].id);
    }

    #[tokio::test]
    async fn rules_come_from_cached_drugs() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalPrescriptionCache::new(dir.path().join("prescriptions.json"));
        cache.add_prescription(new_prescription("Dr. A")).await.unwrap();

        let rules = cache.fetch_active_reminder_rules(None).await.unwrap();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].drug_name, "Omeprazole");
        assert_eq!(rules[0].prescribing_doctor, "Dr. A");
        assert_eq!(rules[0].times_of_day, vec!["07:30"]);
    }

    #[tokio::test]
    async fn deleting_unknown_prescription_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalPrescriptionCache::new(dir.path().join("prescriptions.json"));
        let created = cache.add_prescription(new_prescription("Dr. A")).await.unwrap();

        assert!(matches!(
            cache.delete_prescription(created.id + 1).await,
            Err(StoreError::NotFound(_))
        ));
        cache.delete_prescription(created.id).await.unwrap();
        assert!(cache.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupted_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prescriptions.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let result = LocalPrescriptionCache::new(&path).fetch_active_reminder_rules(None).await;

        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
