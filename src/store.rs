use async_trait::async_trait;

use crate::errors::StoreError;
use crate::models::{
    CompletionFilter, CompletionKey, CompletionRecord, HouseholdAccount, HouseholdId,
    KindnessLedger, Member, MemberId, Pet, PetId, Versioned,
};

#[async_trait]
pub trait CompletionRepository: Send + Sync {
    async fn get_record(
        &self,
        household: &HouseholdId,
        key: &CompletionKey,
    ) -> Result<Option<CompletionRecord>, StoreError>;

    async fn put_record(
        &self,
        household: &HouseholdId,
        record: CompletionRecord,
    ) -> Result<(), StoreError>;

    /// Create only. Returns `false` without writing when the key is taken.
    async fn insert_record(
        &self,
        household: &HouseholdId,
        record: CompletionRecord,
    ) -> Result<bool, StoreError>;

    /// Overwrite only if the stored record still equals `expected`.
    async fn replace_record(
        &self,
        household: &HouseholdId,
        expected: &CompletionRecord,
        record: CompletionRecord,
    ) -> Result<bool, StoreError>;

    async fn delete_record(
        &self,
        household: &HouseholdId,
        key: &CompletionKey,
    ) -> Result<bool, StoreError>;

    async fn query_records(
        &self,
        household: &HouseholdId,
        filter: &CompletionFilter,
    ) -> Result<Vec<CompletionRecord>, StoreError>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn get_ledger(
        &self,
        household: &HouseholdId,
    ) -> Result<Versioned<KindnessLedger>, StoreError>;

    /// Writes `ledger` at `expected_revision + 1` only if the stored revision is
    /// still `expected_revision`.
    async fn swap_ledger(
        &self,
        household: &HouseholdId,
        expected_revision: u64,
        ledger: KindnessLedger,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait HouseholdRepository: Send + Sync {
    async fn create_household(&self, account: HouseholdAccount) -> Result<bool, StoreError>;

    async fn find_household(
        &self,
        id: &HouseholdId,
    ) -> Result<Option<HouseholdAccount>, StoreError>;

    async fn find_household_by_username(
        &self,
        username: &str,
    ) -> Result<Option<HouseholdAccount>, StoreError>;

    async fn list_pets(&self, household: &HouseholdId) -> Result<Vec<Pet>, StoreError>;

    async fn get_pet(
        &self,
        household: &HouseholdId,
        id: &PetId,
    ) -> Result<Option<Pet>, StoreError>;

    async fn put_pet(&self, household: &HouseholdId, pet: Pet) -> Result<(), StoreError>;

    async fn delete_pet(&self, household: &HouseholdId, id: &PetId) -> Result<bool, StoreError>;

    async fn list_members(&self, household: &HouseholdId) -> Result<Vec<Member>, StoreError>;

    async fn get_member(
        &self,
        household: &HouseholdId,
        id: &MemberId,
    ) -> Result<Option<Member>, StoreError>;

    async fn put_member(&self, household: &HouseholdId, member: Member) -> Result<(), StoreError>;

    async fn delete_member(
        &self,
        household: &HouseholdId,
        id: &MemberId,
    ) -> Result<bool, StoreError>;
}
