use crate::errors::StoreError;
use crate::models::{
    CompletionFilter, CompletionKey, CompletionRecord, HouseholdAccount, HouseholdId,
    KindnessLedger, Member, MemberId, Pet, PetId, Versioned,
};
use crate::store::{CompletionRepository, HouseholdRepository, LedgerRepository};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdData {
    #[serde(default)]
    pub account: Option<HouseholdAccount>,
    #[serde(default)]
    pub pets: BTreeMap<PetId, Pet>,
    #[serde(default)]
    pub members: BTreeMap<MemberId, Member>,
    #[serde(default)]
    pub task_completions: BTreeMap<String, CompletionRecord>,
    #[serde(default)]
    pub kindness: Versioned<KindnessLedger>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    pub households: BTreeMap<HouseholdId, HouseholdData>,
}

pub struct JsonStore {
    path: Option<PathBuf>,
    data: Mutex<AppData>,
}

impl JsonStore {
    pub async fn open(path: PathBuf) -> Self {
        let data = load_data(&path).await;
        Self {
            path: Some(path),
            data: Mutex::new(data),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(AppData::default()),
        }
    }

    async fn persist(&self, data: &AppData) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => persist_data(path, data).await,
            None => Ok(()),
        }
    }

    // Memory only changes once the file write succeeds.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut AppData) -> Option<T>,
    ) -> Result<Option<T>, StoreError> {
        let mut data = self.data.lock().await;
        let mut staged = data.clone();
        let Some(outcome) = change(&mut staged) else {
            return Ok(None);
        };
        self.persist(&staged).await?;
        *data = staged;
        Ok(Some(outcome))
    }
}

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!(path = %path.display(), "failed to parse happy pets data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!(path = %path.display(), "failed to read happy pets data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[async_trait]
impl CompletionRepository for JsonStore {
    async fn get_record(
        &self,
        household: &HouseholdId,
        key: &CompletionKey,
    ) -> Result<Option<CompletionRecord>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .households
            .get(household)
            .and_then(|h| h.task_completions.get(&key.to_string()))
            .cloned())
    }

    async fn put_record(
        &self,
        household: &HouseholdId,
        record: CompletionRecord,
    ) -> Result<(), StoreError> {
        self.commit(|data| {
            data.households
                .entry(household.clone())
                .or_default()
                .task_completions
                .insert(record.key().to_string(), record);
            Some(())
        })
        .await?;
        Ok(())
    }

    async fn insert_record(
        &self,
        household: &HouseholdId,
        record: CompletionRecord,
    ) -> Result<bool, StoreError> {
        let inserted = self
            .commit(|data| {
                let completions = &mut data
                    .households
                    .entry(household.clone())
                    .or_default()
                    .task_completions;
                let id = record.key().to_string();
                if completions.contains_key(&id) {
                    return None;
                }
                completions.insert(id, record);
                Some(())
            })
            .await?;
        Ok(inserted.is_some())
    }

    async fn replace_record(
        &self,
        household: &HouseholdId,
        expected: &CompletionRecord,
        record: CompletionRecord,
    ) -> Result<bool, StoreError> {
        let replaced = self
            .commit(|data| {
                let slot = data
                    .households
                    .get_mut(household)?
                    .task_completions
                    .get_mut(&expected.key().to_string())?;
                if slot != expected {
                    return None;
                }
                *slot = record;
                Some(())
            })
            .await?;
        Ok(replaced.is_some())
    }

    async fn delete_record(
        &self,
        household: &HouseholdId,
        key: &CompletionKey,
    ) -> Result<bool, StoreError> {
        let removed = self
            .commit(|data| {
                data.households
                    .get_mut(household)?
                    .task_completions
                    .remove(&key.to_string())
            })
            .await?;
        Ok(removed.is_some())
    }

    async fn query_records(
        &self,
        household: &HouseholdId,
        filter: &CompletionFilter,
    ) -> Result<Vec<CompletionRecord>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .households
            .get(household)
            .map(|h| {
                h.task_completions
                    .values()
                    .filter(|record| filter.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl LedgerRepository for JsonStore {
    async fn get_ledger(
        &self,
        household: &HouseholdId,
    ) -> Result<Versioned<KindnessLedger>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .households
            .get(household)
            .map(|h| h.kindness.clone())
            .unwrap_or_default())
    }

    async fn swap_ledger(
        &self,
        household: &HouseholdId,
        expected_revision: u64,
        ledger: KindnessLedger,
    ) -> Result<bool, StoreError> {
        let swapped = self
            .commit(|data| {
                let current = &mut data.households.entry(household.clone()).or_default().kindness;
                if current.revision != expected_revision {
                    return None;
                }
                *current = Versioned {
                    revision: expected_revision + 1,
                    value: ledger,
                };
                Some(())
            })
            .await?;
        Ok(swapped.is_some())
    }
}

#[async_trait]
impl HouseholdRepository for JsonStore {
    async fn create_household(&self, account: HouseholdAccount) -> Result<bool, StoreError> {
        let created = self
            .commit(|data| {
                let taken = data.households.values().any(|h| {
                    h.account
                        .as_ref()
                        .is_some_and(|existing| existing.username == account.username)
                });
                if taken || data.households.contains_key(&account.id) {
                    return None;
                }
                data.households.insert(
                    account.id.clone(),
                    HouseholdData {
                        account: Some(account),
                        ..HouseholdData::default()
                    },
                );
                Some(())
            })
            .await?;
        Ok(created.is_some())
    }

    async fn find_household(
        &self,
        id: &HouseholdId,
    ) -> Result<Option<HouseholdAccount>, StoreError> {
        let data = self.data.lock().await;
        Ok(data.households.get(id).and_then(|h| h.account.clone()))
    }

    async fn find_household_by_username(
        &self,
        username: &str,
    ) -> Result<Option<HouseholdAccount>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .households
            .values()
            .filter_map(|h| h.account.as_ref())
            .find(|account| account.username == username)
            .cloned())
    }

    async fn list_pets(&self, household: &HouseholdId) -> Result<Vec<Pet>, StoreError> {
        let data = self.data.lock().await;
        let mut pets: Vec<Pet> = data
            .households
            .get(household)
            .map(|h| h.pets.values().cloned().collect())
            .unwrap_or_default();
        pets.sort_by_key(|pet| pet.created_at);
        Ok(pets)
    }

    async fn get_pet(
        &self,
        household: &HouseholdId,
        id: &PetId,
    ) -> Result<Option<Pet>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .households
            .get(household)
            .and_then(|h| h.pets.get(id))
            .cloned())
    }

    async fn put_pet(&self, household: &HouseholdId, pet: Pet) -> Result<(), StoreError> {
        self.commit(|data| {
            data.households
                .entry(household.clone())
                .or_default()
                .pets
                .insert(pet.id.clone(), pet);
            Some(())
        })
        .await?;
        Ok(())
    }

    async fn delete_pet(&self, household: &HouseholdId, id: &PetId) -> Result<bool, StoreError> {
        let removed = self
            .commit(|data| data.households.get_mut(household)?.pets.remove(id))
            .await?;
        Ok(removed.is_some())
    }

    async fn list_members(&self, household: &HouseholdId) -> Result<Vec<Member>, StoreError> {
        let data = self.data.lock().await;
        let mut members: Vec<Member> = data
            .households
            .get(household)
            .map(|h| h.members.values().cloned().collect())
            .unwrap_or_default();
        members.sort_by_key(|member| member.created_at);
        Ok(members)
    }

    async fn get_member(
        &self,
        household: &HouseholdId,
        id: &MemberId,
    ) -> Result<Option<Member>, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .households
            .get(household)
            .and_then(|h| h.members.get(id))
            .cloned())
    }

    async fn put_member(&self, household: &HouseholdId, member: Member) -> Result<(), StoreError> {
        self.commit(|data| {
            data.households
                .entry(household.clone())
                .or_default()
                .members
                .insert(member.id.clone(), member);
            Some(())
        })
        .await?;
        Ok(())
    }

    async fn delete_member(
        &self,
        household: &HouseholdId,
        id: &MemberId,
    ) -> Result<bool, StoreError> {
        let removed = self
            .commit(|data| data.households.get_mut(household)?.members.remove(id))
            .await?;
        Ok(removed.is_some())
    }
}
