use crate::clock::DayKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_AVATAR: &str = "👤";
pub const DEFAULT_MEMBER_COLOR: &str = "#7C9FE8";
pub const ANONYMOUS_NAME: &str = "Someone";

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

define_id!(HouseholdId);
define_id!(
    /// Generated ids are uuids, so they never contain `_`.
    PetId
);
define_id!(MemberId);
define_id!(TaskId);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdAccount {
    pub id: HouseholdId,
    pub username: String,
    pub password_hash: String,
    pub family_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub avatar: String,
    pub color: String,
    pub is_parent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub tasks: Vec<TaskId>,
    #[serde(default)]
    pub custom_tasks: Vec<CustomTask>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Unrecognised values are kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SchedulePolicy {
    Daily,
    Weekly,
    Other(String),
}

impl From<String> for SchedulePolicy {
    fn from(value: String) -> Self {
        match value.as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            _ => Self::Other(value),
        }
    }
}

impl From<SchedulePolicy> for String {
    fn from(policy: SchedulePolicy) -> Self {
        match policy {
            SchedulePolicy::Daily => "daily".to_owned(),
            SchedulePolicy::Weekly => "weekly".to_owned(),
            SchedulePolicy::Other(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTask {
    #[serde(default)]
    pub id: Option<TaskId>,
    #[serde(default)]
    pub icon: String,
    pub name: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub schedule: Option<SchedulePolicy>,
    #[serde(default)]
    pub days: BTreeSet<u8>,
    #[serde(default)]
    pub requires_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub id: TaskId,
    pub icon: String,
    pub name: String,
    pub hint: String,
    pub schedule: Option<SchedulePolicy>,
    pub days: BTreeSet<u8>,
    pub requires_approval: bool,
    pub custom: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Pending,
    Approved,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompletionKey {
    pub day: DayKey,
    pub pet_id: PetId,
    pub task_id: TaskId,
}

impl CompletionKey {
    pub fn new(day: DayKey, pet_id: PetId, task_id: TaskId) -> Self {
        Self {
            day,
            pet_id,
            task_id,
        }
    }

    /// Parses `"{day}_{petId}_{taskId}"`. Task ids may themselves contain `_`.
    pub fn parse(id: &str) -> Option<Self> {
        let (day, rest) = id.split_once('_')?;
        let (pet, task) = rest.split_once('_')?;
        if pet.is_empty() || task.is_empty() {
            return None;
        }
        Some(Self {
            day: DayKey::parse(day)?,
            pet_id: PetId::new(pet),
            task_id: TaskId::new(task),
        })
    }
}

impl fmt::Display for CompletionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.day, self.pet_id, self.task_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub pet_id: PetId,
    pub task_id: TaskId,
    pub date: DayKey,
    pub completed_by: Option<MemberId>,
    pub completed_by_name: String,
    pub completed_by_avatar: String,
    pub completed_at: DateTime<Utc>,
    pub status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// Set once the ledger credit for this record has been issued.
    #[serde(default)]
    pub rewarded: bool,
}

impl CompletionRecord {
    pub fn key(&self) -> CompletionKey {
        CompletionKey::new(self.date, self.pet_id.clone(), self.task_id.clone())
    }

    pub fn is_approved(&self) -> bool {
        self.status == CompletionStatus::Approved
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindnessLedger {
    pub total: u64,
    #[serde(default)]
    pub by_member: BTreeMap<MemberId, u64>,
    #[serde(default)]
    pub today: u64,
    #[serde(default)]
    pub last_date: Option<DayKey>,
}

impl KindnessLedger {
    pub fn add_credit(&mut self, day: DayKey, member: Option<&MemberId>) {
        if self.last_date != Some(day) {
            self.today = 0;
            self.last_date = Some(day);
        }
        self.today += 1;
        self.total += 1;
        if let Some(member) = member {
            *self.by_member.entry(member.clone()).or_insert(0) += 1;
        }
    }

    pub fn credits_on(&self, day: DayKey) -> u64 {
        if self.last_date == Some(day) {
            self.today
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub revision: u64,
    pub value: T,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionFilter {
    pub pet_id: Option<PetId>,
    pub day: Option<DayKey>,
    pub status: Option<CompletionStatus>,
}

impl CompletionFilter {
    pub fn matches(&self, record: &CompletionRecord) -> bool {
        self.pet_id.as_ref().is_none_or(|pet| *pet == record.pet_id)
            && self.day.is_none_or(|day| day == record.date)
            && self.status.is_none_or(|status| status == record.status)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    pub family_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdResponse {
    pub household_id: HouseholdId,
    pub family_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewMember {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_parent: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub color: Option<String>,
    pub is_parent: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPet {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub tasks: Option<Vec<TaskId>>,
    #[serde(default)]
    pub custom_tasks: Vec<CustomTask>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PetUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub breed: Option<String>,
    pub tasks: Option<Vec<TaskId>>,
    pub custom_tasks: Option<Vec<CustomTask>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToggleRequest {
    pub requires_approval: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub completed: bool,
    pub record: Option<CompletionRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBoardEntry {
    pub task: TaskDefinition,
    pub completion: Option<CompletionRecord>,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBoard {
    pub date: DayKey,
    pub weekday: u8,
    pub pet: Pet,
    pub tasks: Vec<TaskBoardEntry>,
    pub approved_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindnessResponse {
    pub total: u64,
    pub today: u64,
    pub by_member: BTreeMap<MemberId, u64>,
    pub level: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: String,
    pub weekday: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    pub today: u64,
    pub this_week: u64,
    pub total: u64,
    pub name: String,
    pub avatar: String,
}
