use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::DayKey;
use crate::errors::AppError;
use crate::models::{HouseholdId, KindnessLedger, KindnessResponse, MemberId};
use crate::store::LedgerRepository;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

// Refills every twenty credits.
pub fn level(total: u64) -> u8 {
    ((total % 20) * 5 + 5).min(100) as u8
}

#[derive(Clone)]
pub struct LedgerService {
    repo: Arc<dyn LedgerRepository>,
    max_attempts: u32,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn LedgerRepository>, max_attempts: u32) -> Self {
        Self {
            repo,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn get(&self, household: &HouseholdId) -> Result<KindnessLedger, AppError> {
        Ok(self.repo.get_ledger(household).await?.value)
    }

    pub async fn summary(
        &self,
        household: &HouseholdId,
        today: DayKey,
    ) -> Result<KindnessResponse, AppError> {
        let ledger = self.get(household).await?;
        Ok(KindnessResponse {
            level: level(ledger.total),
            today: ledger.credits_on(today),
            total: ledger.total,
            by_member: ledger.by_member,
        })
    }

    pub async fn credit(
        &self,
        household: &HouseholdId,
        member: Option<&MemberId>,
        day: DayKey,
    ) -> Result<KindnessLedger, AppError> {
        self.update(household, |ledger| ledger.add_credit(day, member)).await
    }

    pub async fn update<F>(&self, household: &HouseholdId, apply: F) -> Result<KindnessLedger, AppError>
    where
        F: Fn(&mut KindnessLedger) + Send + Sync,
    {
        for attempt in 1..=self.max_attempts {
            let current = self.repo.get_ledger(household).await?;
            let mut next = current.value;
            apply(&mut next);
            if self
                .repo
                .swap_ledger(household, current.revision, next.clone())
                .await?
            {
                debug!(%household, total = next.total, attempt, "ledger updated");
                return Ok(next);
            }
            warn!(%household, attempt, "ledger revision moved, retrying");
        }
        Err(AppError::Conflict(format!(
            "kindness ledger update gave up after {} attempts",
            self.max_attempts
        )))
    }
}
