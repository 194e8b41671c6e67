mod model;

use async_trait::async_trait;
use model::{DrugStorageModel, PrescriptionStorageModel, ReminderTimeStorageModel, assemble};
use pillminder_models::{
    prescription::{NewPrescription, Prescription, PrescriptionId},
    reminder::ReminderRule,
    user::OwnerId,
};

use crate::{PrescriptionStore, StoreError};

pub struct SqlitePrescriptionStore {
    pool: sqlx::SqlitePool,
}

impl SqlitePrescriptionStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest issue date first.
    pub async fn get_prescriptions(
        &self,
        owner: &OwnerId,
    ) -> Result<Vec<Prescription>, StoreError> {
        let prescriptions = sqlx::query_as::<_, PrescriptionStorageModel>(
            "SELECT id, prescribing_doctor, issue_date, file_data, file_type
FROM prescriptions
WHERE user_id = ?
ORDER BY issue_date DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let drugs = sqlx::query_as::<_, DrugStorageModel>(
            "SELECT d.id, d.prescription_id, d.drug_name, d.dosage, d.reminder_enabled
FROM prescription_drugs d
JOIN prescriptions p ON p.id = d.prescription_id
WHERE p.user_id = ?
ORDER BY d.id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let times = sqlx::query_as::<_, ReminderTimeStorageModel>(
            "SELECT t.drug_id, t.reminder_time
FROM drug_reminder_times t
JOIN prescription_drugs d ON d.id = t.drug_id
JOIN prescriptions p ON p.id = d.prescription_id
WHERE p.user_id = ?
ORDER BY t.id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble(prescriptions, drugs, times))
    }

    pub async fn add_prescription(
        &self,
        owner: &OwnerId,
        prescription: NewPrescription,
    ) -> Result<Prescription, StoreError> {
        let NewPrescription {
            doctor,
            issue_date,
            drugs,
            file_data,
            file_type,
        } = prescription;

        let mut tx = self.pool.begin().await?;

        let prescription_id = sqlx::query(
            "INSERT INTO prescriptions
    (user_id, prescribing_doctor, issue_date, file_data, file_type)
VALUES (?, ?, ?, ?, ?)",
        )
        .bind(owner)
        .bind(&doctor)
        .bind(issue_date)
        .bind(&file_data)
        .bind(&file_type)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for drug in &drugs {
            let drug_id = sqlx::query(
                "INSERT INTO prescription_drugs
    (prescription_id, drug_name, dosage, reminder_enabled)
VALUES (?, ?, ?, ?)",
            )
            .bind(prescription_id)
            .bind(&drug.name)
            .bind(&drug.dosage)
            .bind(drug.reminder_enabled)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            for time in &drug.reminder_times {
                sqlx::query(
                    "INSERT INTO drug_reminder_times (drug_id, reminder_time) VALUES (?, ?)",
                )
                .bind(drug_id)
                .bind(time)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        log::info!("Added prescription {prescription_id} with {} drugs", drugs.len());

        self.get_prescriptions(owner)
            .await?
            .into_iter()
            .find(|p| p.id == prescription_id)
            .ok_or(StoreError::NotFound(prescription_id))
    }

    pub async fn delete_prescription(
        &self,
        owner: &OwnerId,
        id: PrescriptionId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM prescriptions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }
}

#[async_trait]
impl PrescriptionStore for SqlitePrescriptionStore {
    async fn fetch_active_reminder_rules(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<ReminderRule>, StoreError> {
        let Some(owner) = owner else {
            return Ok(Vec::new());
        };

        let prescriptions = self.get_prescriptions(owner).await?;

        Ok(prescriptions
            .iter()
            .flat_map(|p| p.reminder_rules())
            .collect())
    }
}
