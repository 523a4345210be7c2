use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clock::{DayKey, SharedClock};
use crate::errors::{AppError, require};
use crate::ledger::LedgerService;
use crate::models::{
    ANONYMOUS_NAME, CompletionFilter, CompletionKey, CompletionRecord, CompletionStatus,
    DEFAULT_AVATAR, HouseholdId, PetId, TaskId, ToggleResponse,
};
use crate::session::Session;
use crate::store::CompletionRepository;

#[derive(Clone)]
pub struct CompletionService {
    repo: Arc<dyn CompletionRepository>,
    ledger: LedgerService,
    clock: SharedClock,
}

impl CompletionService {
    pub fn new(
        repo: Arc<dyn CompletionRepository>,
        ledger: LedgerService,
        clock: SharedClock,
    ) -> Self {
        Self {
            repo,
            ledger,
            clock,
        }
    }

    pub fn today(&self) -> DayKey {
        DayKey::today(self.clock.as_ref())
    }

    pub async fn toggle(
        &self,
        session: &Session,
        pet_id: &PetId,
        task_id: &TaskId,
        requires_approval: bool,
    ) -> Result<ToggleResponse, AppError> {
        require(pet_id.as_str(), "pet id")?;
        require(task_id.as_str(), "task id")?;
        let household = &session.household_id;
        let now = self.clock.utc();
        let key = CompletionKey::new(DayKey::new(now.date_naive()), pet_id.clone(), task_id.clone());

        match self.repo.get_record(household, &key).await? {
            None => {
                let needs_approval = requires_approval && !session.is_parent();
                let status = if needs_approval {
                    CompletionStatus::Pending
                } else {
                    CompletionStatus::Approved
                };
                let member = session.member.as_ref();
                let record = CompletionRecord {
                    pet_id: pet_id.clone(),
                    task_id: task_id.clone(),
                    date: key.day,
                    completed_by: member.map(|m| m.id.clone()),
                    completed_by_name: member.map_or_else(|| ANONYMOUS_NAME.to_owned(), |m| m.name.clone()),
                    completed_by_avatar: member.map_or_else(|| DEFAULT_AVATAR.to_owned(), |m| m.avatar.clone()),
                    completed_at: now,
                    status,
                    approved_by: None,
                    approved_by_name: None,
                    approved_at: None,
                    rewarded: !needs_approval,
                };

                if !self.repo.insert_record(household, record.clone()).await? {
                    // Someone else completed it first; report their outcome.
                    let current = self.repo.get_record(household, &key).await?;
                    return Ok(Self::outcome(current));
                }
                info!(%household, completion = %key, ?status, "task completed");
                if record.rewarded {
                    if let Err(err) = self
                        .ledger
                        .credit(household, record.completed_by.as_ref(), key.day)
                        .await
                    {
                        // Approved records are only ever deleted.
                        if let Err(undo) = self.repo.delete_record(household, &key).await {
                            error!(%household, completion = %key, "failed to withdraw uncredited completion: {undo}");
                        }
                        return Err(err);
                    }
                }
                Ok(Self::outcome(Some(record)))
            }
            Some(existing)
                if existing.status == CompletionStatus::Pending && session.is_parent() =>
            {
                let approved = self.approve_record(session, existing).await?;
                Ok(Self::outcome(Some(approved)))
            }
            Some(_) => {
                self.repo.delete_record(household, &key).await?;
                info!(%household, completion = %key, "task marked incomplete");
                Ok(Self::outcome(None))
            }
        }
    }

    pub async fn approve(
        &self,
        session: &Session,
        completion_id: &str,
    ) -> Result<CompletionRecord, AppError> {
        Self::require_parent(session, "approve")?;
        let key = Self::parse_id(completion_id)?;
        let record = self
            .repo
            .get_record(&session.household_id, &key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("completion {completion_id}")))?;
        if record.is_approved() {
            return Err(AppError::InvalidState(format!(
                "completion {completion_id} is already approved"
            )));
        }
        self.approve_record(session, record).await
    }

    pub async fn reject(&self, session: &Session, completion_id: &str) -> Result<bool, AppError> {
        Self::require_parent(session, "reject")?;
        let key = Self::parse_id(completion_id)?;
        let removed = self.repo.delete_record(&session.household_id, &key).await?;
        if removed {
            info!(household = %session.household_id, completion = %key, "completion rejected");
        }
        Ok(removed)
    }

    pub async fn is_complete(
        &self,
        household: &HouseholdId,
        pet_id: &PetId,
        task_id: &TaskId,
    ) -> Result<bool, AppError> {
        Ok(self
            .details(household, pet_id, task_id)
            .await?
            .is_some_and(|record| record.is_approved()))
    }

    pub async fn details(
        &self,
        household: &HouseholdId,
        pet_id: &PetId,
        task_id: &TaskId,
    ) -> Result<Option<CompletionRecord>, AppError> {
        let key = CompletionKey::new(self.today(), pet_id.clone(), task_id.clone());
        Ok(self.repo.get_record(household, &key).await?)
    }

    pub async fn count_approved_for_pet(
        &self,
        household: &HouseholdId,
        pet_id: &PetId,
    ) -> Result<usize, AppError> {
        let filter = CompletionFilter {
            pet_id: Some(pet_id.clone()),
            day: Some(self.today()),
            status: Some(CompletionStatus::Approved),
        };
        Ok(self.repo.query_records(household, &filter).await?.len())
    }

    pub async fn today_records(
        &self,
        household: &HouseholdId,
    ) -> Result<Vec<CompletionRecord>, AppError> {
        let filter = CompletionFilter {
            day: Some(self.today()),
            ..CompletionFilter::default()
        };
        Ok(self.repo.query_records(household, &filter).await?)
    }

    pub async fn pending_approvals(
        &self,
        household: &HouseholdId,
    ) -> Result<Vec<CompletionRecord>, AppError> {
        let filter = CompletionFilter {
            day: Some(self.today()),
            status: Some(CompletionStatus::Pending),
            ..CompletionFilter::default()
        };
        Ok(self.repo.query_records(household, &filter).await?)
    }

    pub async fn history(&self, household: &HouseholdId) -> Result<Vec<CompletionRecord>, AppError> {
        Ok(self
            .repo
            .query_records(household, &CompletionFilter::default())
            .await?)
    }

    pub async fn purge_pet(&self, household: &HouseholdId, pet_id: &PetId) -> Result<usize, AppError> {
        let filter = CompletionFilter {
            pet_id: Some(pet_id.clone()),
            ..CompletionFilter::default()
        };
        let mut removed = 0;
        for record in self.repo.query_records(household, &filter).await? {
            if self.repo.delete_record(household, &record.key()).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn approve_record(
        &self,
        session: &Session,
        record: CompletionRecord,
    ) -> Result<CompletionRecord, AppError> {
        let household = &session.household_id;
        let approver = session.member.as_ref();
        let approved = CompletionRecord {
            status: CompletionStatus::Approved,
            approved_by: approver.map(|m| m.id.clone()),
            approved_by_name: approver.map(|m| m.name.clone()),
            approved_at: Some(self.clock.utc()),
            rewarded: true,
            ..record.clone()
        };

        if !self
            .repo
            .replace_record(household, &record, approved.clone())
            .await?
        {
            warn!(%household, completion = %record.key(), "completion changed before approval");
            return Err(AppError::InvalidState(format!(
                "completion {} changed before it could be approved",
                record.key()
            )));
        }
        info!(%household, completion = %record.key(), "completion approved");
        if !record.rewarded {
            if let Err(err) = self
                .ledger
                .credit(household, record.completed_by.as_ref(), self.today())
                .await
            {
                match self.repo.replace_record(household, &approved, record.clone()).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(%household, completion = %record.key(), "approved completion changed before it could be reverted")
                    }
                    Err(undo) => {
                        error!(%household, completion = %record.key(), "failed to revert uncredited approval: {undo}")
                    }
                }
                return Err(err);
            }
        }
        Ok(approved)
    }

    fn outcome(record: Option<CompletionRecord>) -> ToggleResponse {
        ToggleResponse {
            completed: record.as_ref().is_some_and(CompletionRecord::is_approved),
            record,
        }
    }

    fn require_parent(session: &Session, action: &str) -> Result<(), AppError> {
        if session.is_parent() {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!("only parents can {action} tasks")))
        }
    }

    fn parse_id(completion_id: &str) -> Result<CompletionKey, AppError> {
        require(completion_id, "completion id")?;
        CompletionKey::parse(completion_id)
            .ok_or_else(|| AppError::validation(format!("malformed completion id: {completion_id}")))
    }
}
