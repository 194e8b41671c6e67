use std::{future::Future, time::Duration};

use async_trait::async_trait;
use pillminder_models::{
    prescription::{NewPrescription, Prescription, PrescriptionId},
    reminder::ReminderRule,
    user::OwnerId,
};

use crate::{LocalPrescriptionCache, PrescriptionStore, SqlitePrescriptionStore, StoreError};

/// Routes signed-in owners to the database and everyone else to the local
/// cache. Database calls are bounded by `fetch_timeout`.
pub struct SessionPrescriptionStore {
    remote: SqlitePrescriptionStore,
    local: LocalPrescriptionCache,
    fetch_timeout: Duration,
}

impl SessionPrescriptionStore {
    pub fn new(
        remote: SqlitePrescriptionStore,
        local: LocalPrescriptionCache,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            remote,
            local,
            fetch_timeout,
        }
    }

    pub async fn list_prescriptions(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<Prescription>, StoreError> {
        match owner {
            Some(owner) => self.bounded(self.remote.get_prescriptions(owner)).await,
            None => self.local.load().await,
        }
    }

    pub async fn add_prescription(
        &self,
        owner: Option<&OwnerId>,
        prescription: NewPrescription,
    ) -> Result<Prescription, StoreError> {
        match owner {
            Some(owner) => {
                self.bounded(self.remote.add_prescription(owner, prescription))
                    .await
            }
            None => self.local.add_prescription(prescription).await,
        }
    }

    pub async fn delete_prescription(
        &self,
        owner: Option<&OwnerId>,
        id: PrescriptionId,
    ) -> Result<(), StoreError> {
        match owner {
            Some(owner) => self.bounded(self.remote.delete_prescription(owner, id)).await,
            None => self.local.delete_prescription(id).await,
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.fetch_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.fetch_timeout))?
    }
}

#[async_trait]
impl PrescriptionStore for SessionPrescriptionStore {
    async fn fetch_active_reminder_rules(
        &self,
        owner: Option<&OwnerId>,
    ) -> Result<Vec<ReminderRule>, StoreError> {
        match owner {
            Some(_) => {
                self.bounded(self.remote.fetch_active_reminder_rules(owner))
                    .await
            }
            None => self.local.fetch_active_reminder_rules(None).await,
        }
    }
}
