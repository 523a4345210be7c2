use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::catalog::{self, default_tasks};
use crate::clock::{DayKey, SharedClock};
use crate::completion::CompletionService;
use crate::errors::{AppError, require};
use crate::models::{
    CustomTask, DEFAULT_AVATAR, DEFAULT_MEMBER_COLOR, HouseholdAccount, HouseholdId,
    HouseholdResponse, LoginRequest, Member, MemberId, MemberUpdate, NewMember, NewPet, Pet,
    PetId, PetUpdate, SignUpRequest, TaskBoard, TaskBoardEntry, TaskId, ToggleResponse,
};
use crate::schedule::due_tasks;
use crate::session::Session;
use crate::store::HouseholdRepository;

#[derive(Clone)]
pub struct HouseholdService {
    repo: Arc<dyn HouseholdRepository>,
    completions: CompletionService,
    clock: SharedClock,
}

impl HouseholdService {
    pub fn new(
        repo: Arc<dyn HouseholdRepository>,
        completions: CompletionService,
        clock: SharedClock,
    ) -> Self {
        Self {
            repo,
            completions,
            clock,
        }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<HouseholdResponse, AppError> {
        require(&request.username, "username")?;
        require(&request.password, "password")?;
        require(&request.family_name, "family name")?;

        let account = HouseholdAccount {
            id: HouseholdId::random(),
            username: request.username.trim().to_lowercase(),
            password_hash: hash_password(&request.password)?,
            family_name: request.family_name.trim().to_owned(),
            created_at: self.clock.utc(),
        };
        let response = HouseholdResponse {
            household_id: account.id.clone(),
            family_name: account.family_name.clone(),
        };
        if !self.repo.create_household(account).await? {
            return Err(AppError::Duplicate("username already taken".into()));
        }
        info!(household = %response.household_id, "household registered");
        Ok(response)
    }

    pub async fn log_in(&self, request: LoginRequest) -> Result<HouseholdResponse, AppError> {
        let username = request.username.trim().to_lowercase();
        let account = self
            .repo
            .find_household_by_username(&username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&request.password, &account.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }
        Ok(HouseholdResponse {
            household_id: account.id,
            family_name: account.family_name,
        })
    }

    pub async fn resolve_session(
        &self,
        household_id: HouseholdId,
        member_id: Option<&MemberId>,
    ) -> Result<Session, AppError> {
        if self.repo.find_household(&household_id).await?.is_none() {
            return Err(AppError::NotLoggedIn);
        }
        let member = match member_id {
            Some(id) => Some(
                self.repo
                    .get_member(&household_id, id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("member {id}")))?,
            ),
            None => None,
        };
        Ok(Session {
            household_id,
            member,
        })
    }

    pub async fn list_members(&self, session: &Session) -> Result<Vec<Member>, AppError> {
        Ok(self.repo.list_members(&session.household_id).await?)
    }

    pub async fn add_member(&self, session: &Session, new: NewMember) -> Result<Member, AppError> {
        require(&new.name, "member name")?;
        let member = Member {
            id: MemberId::random(),
            name: new.name.trim().to_owned(),
            avatar: non_blank(new.avatar).unwrap_or_else(|| DEFAULT_AVATAR.to_owned()),
            color: non_blank(new.color).unwrap_or_else(|| DEFAULT_MEMBER_COLOR.to_owned()),
            is_parent: new.is_parent,
            created_at: self.clock.utc(),
        };
        self.repo
            .put_member(&session.household_id, member.clone())
            .await?;
        Ok(member)
    }

    pub async fn update_member(
        &self,
        session: &Session,
        id: &MemberId,
        update: MemberUpdate,
    ) -> Result<Member, AppError> {
        let mut member = self
            .repo
            .get_member(&session.household_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("member {id}")))?;
        if let Some(name) = update.name {
            require(&name, "member name")?;
            member.name = name.trim().to_owned();
        }
        if let Some(avatar) = non_blank(update.avatar) {
            member.avatar = avatar;
        }
        if let Some(color) = non_blank(update.color) {
            member.color = color;
        }
        if let Some(is_parent) = update.is_parent {
            member.is_parent = is_parent;
        }
        self.repo
            .put_member(&session.household_id, member.clone())
            .await?;
        Ok(member)
    }

    pub async fn delete_member(&self, session: &Session, id: &MemberId) -> Result<(), AppError> {
        if !self.repo.delete_member(&session.household_id, id).await? {
            return Err(AppError::not_found(format!("member {id}")));
        }
        Ok(())
    }

    pub async fn list_pets(&self, session: &Session) -> Result<Vec<Pet>, AppError> {
        Ok(self.repo.list_pets(&session.household_id).await?)
    }

    pub async fn get_pet(&self, session: &Session, id: &PetId) -> Result<Pet, AppError> {
        require(id.as_str(), "pet id")?;
        self.repo
            .get_pet(&session.household_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("pet {id}")))
    }

    pub async fn add_pet(&self, session: &Session, new: NewPet) -> Result<Pet, AppError> {
        require(&new.name, "pet name")?;
        let kind = known_pet_type(&new.kind)?;
        let pet = Pet {
            id: PetId::random(),
            name: new.name.trim().to_owned(),
            kind,
            breed: new.breed.map(|b| b.trim().to_owned()).unwrap_or_default(),
            tasks: new.tasks.unwrap_or_else(default_tasks),
            custom_tasks: prepare_custom_tasks(new.custom_tasks)?,
            created_at: self.clock.utc(),
            updated_at: None,
        };
        self.repo.put_pet(&session.household_id, pet.clone()).await?;
        info!(household = %session.household_id, pet = %pet.id, "pet added");
        Ok(pet)
    }

    pub async fn update_pet(
        &self,
        session: &Session,
        id: &PetId,
        update: PetUpdate,
    ) -> Result<Pet, AppError> {
        let mut pet = self.get_pet(session, id).await?;
        if let Some(name) = update.name {
            require(&name, "pet name")?;
            pet.name = name.trim().to_owned();
        }
        if let Some(kind) = update.kind {
            pet.kind = known_pet_type(&kind)?;
        }
        if let Some(breed) = update.breed {
            pet.breed = breed.trim().to_owned();
        }
        if let Some(tasks) = update.tasks {
            pet.tasks = tasks;
        }
        if let Some(custom) = update.custom_tasks {
            pet.custom_tasks = prepare_custom_tasks(custom)?;
        }
        pet.updated_at = Some(self.clock.utc());
        self.repo.put_pet(&session.household_id, pet.clone()).await?;
        Ok(pet)
    }

    pub async fn delete_pet(&self, session: &Session, id: &PetId) -> Result<(), AppError> {
        require(id.as_str(), "pet id")?;
        let household = &session.household_id;
        let purged = self.completions.purge_pet(household, id).await?;
        if !self.repo.delete_pet(household, id).await? {
            return Err(AppError::not_found(format!("pet {id}")));
        }
        info!(%household, pet = %id, purged, "pet deleted");
        Ok(())
    }

    pub async fn task_board(&self, session: &Session, id: &PetId) -> Result<TaskBoard, AppError> {
        let pet = self.get_pet(session, id).await?;
        let today = DayKey::today(self.clock.as_ref());
        let household = &session.household_id;

        let mut tasks = Vec::new();
        for task in due_tasks(catalog::pet_tasks(&pet), today.weekday()) {
            let completion = self.completions.details(household, &pet.id, &task.id).await?;
            tasks.push(TaskBoardEntry {
                completed: completion.as_ref().is_some_and(|c| c.is_approved()),
                completion,
                task,
            });
        }
        let approved_count = self
            .completions
            .count_approved_for_pet(household, &pet.id)
            .await?;

        Ok(TaskBoard {
            date: today,
            weekday: today.weekday(),
            pet,
            tasks,
            approved_count,
        })
    }

    pub async fn toggle_task(
        &self,
        session: &Session,
        pet_id: &PetId,
        task_id: &TaskId,
        requires_approval: Option<bool>,
    ) -> Result<ToggleResponse, AppError> {
        require(task_id.as_str(), "task id")?;
        let pet = self.get_pet(session, pet_id).await?;
        let task = catalog::find_task(&pet, task_id)
            .ok_or_else(|| AppError::not_found(format!("task {task_id} for pet {pet_id}")))?;
        let requires_approval = requires_approval.unwrap_or(task.requires_approval);
        self.completions
            .toggle(session, pet_id, task_id, requires_approval)
            .await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn known_pet_type(kind: &str) -> Result<String, AppError> {
    require(kind, "pet type")?;
    catalog::pet_type(kind)
        .map(|known| known.id.to_owned())
        .ok_or_else(|| AppError::validation(format!("unknown pet type: {}", kind.trim())))
}

fn prepare_custom_tasks(tasks: Vec<CustomTask>) -> Result<Vec<CustomTask>, AppError> {
    let mut seen = BTreeSet::new();
    tasks
        .into_iter()
        .map(|mut task| {
            require(&task.name, "custom task name")?;
            let id = match task.id.take() {
                Some(id) if !id.as_str().trim().is_empty() => id,
                _ => TaskId::new(format!("custom-{}", Uuid::new_v4())),
            };
            if catalog::lookup(id.as_str()).is_some() || !seen.insert(id.clone()) {
                return Err(AppError::validation(format!("duplicate task id: {id}")));
            }
            if let Some(day) = task.days.iter().find(|day| **day > 6) {
                return Err(AppError::validation(format!(
                    "weekday {day} out of range, expected 0 (Sunday) to 6"
                )));
            }
            task.id = Some(id);
            Ok(task)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::FixedClock;
    use crate::ledger::{DEFAULT_MAX_ATTEMPTS, LedgerService};
    use crate::models::SchedulePolicy;
    use crate::storage::JsonStore;

    struct Fixture {
        store: Arc<JsonStore>,
        households: HouseholdService,
        ledger: LedgerService,
    }

    // 2026-03-03 is a Tuesday.
    fn fixture() -> Fixture {
        let store = Arc::new(JsonStore::in_memory());
        let clock: SharedClock = Arc::new(FixedClock::at(2026, 3, 3, 8));
        let ledger = LedgerService::new(store.clone(), DEFAULT_MAX_ATTEMPTS);
        let completions = CompletionService::new(store.clone(), ledger.clone(), clock.clone());
        Fixture {
            households: HouseholdService::new(store.clone(), completions, clock),
            store,
            ledger,
        }
    }

    async fn signed_up(f: &Fixture) -> Session {
        let response = f
            .households
            .sign_up(SignUpRequest {
                username: "Smiths".into(),
                password: "hunter2".into(),
                family_name: "The Smiths".into(),
            })
            .await
            .unwrap();
        f.households
            .resolve_session(response.household_id, None)
            .await
            .unwrap()
    }

    fn new_pet(custom: Vec<CustomTask>) -> NewPet {
        NewPet {
            name: "Rex".into(),
            kind: "dog".into(),
            breed: None,
            tasks: None,
            custom_tasks: custom,
        }
    }

    fn custom(name: &str, schedule: Option<SchedulePolicy>, days: &[u8]) -> CustomTask {
        CustomTask {
            id: None,
            icon: "⭐".into(),
            name: name.into(),
            detail: String::new(),
            schedule,
            days: days.iter().copied().collect(),
            requires_approval: false,
        }
    }

    #[tokio::test]
    async fn sign_up_and_log_in_ignore_username_case() {
        let f = fixture();
        let session = signed_up(&f).await;

        let login = f
            .households
            .log_in(LoginRequest {
                username: "SMITHS".into(),
                password: "hunter2".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.household_id, session.household_id);
        assert_eq!(login.family_name, "The Smiths");

        let wrong = f
            .households
            .log_in(LoginRequest {
                username: "smiths".into(),
                password: "hunter3".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_username_is_refused() {
        let f = fixture();
        signed_up(&f).await;

        let err = f
            .households
            .sign_up(SignUpRequest {
                username: "smiths".into(),
                password: "other".into(),
                family_name: "Other Smiths".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
    }

    #[tokio::test]
    async fn unknown_household_or_member_cannot_act() {
        let f = fixture();
        let session = signed_up(&f).await;

        let err = f
            .households
            .resolve_session(HouseholdId::new("nope"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotLoggedIn));

        let err = f
            .households
            .resolve_session(session.household_id, Some(&MemberId::new("ghost")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn members_get_defaults_and_can_be_updated() {
        let f = fixture();
        let session = signed_up(&f).await;

        let kid = f
            .households
            .add_member(
                &session,
                NewMember {
                    name: "Ava".into(),
                    avatar: None,
                    color: Some("  ".into()),
                    is_parent: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(kid.avatar, DEFAULT_AVATAR);
        assert_eq!(kid.color, DEFAULT_MEMBER_COLOR);

        let promoted = f
            .households
            .update_member(
                &session,
                &kid.id,
                MemberUpdate {
                    is_parent: Some(true),
                    ..MemberUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(promoted.is_parent);
        assert_eq!(promoted.name, "Ava");

        f.households.delete_member(&session, &kid.id).await.unwrap();
        let err = f.households.delete_member(&session, &kid.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn new_pet_gets_default_tasks_and_custom_ids() {
        let f = fixture();
        let session = signed_up(&f).await;

        let pet = f
            .households
            .add_pet(&session, new_pet(vec![custom("Bath", None, &[])]))
            .await
            .unwrap();

        assert_eq!(pet.tasks, default_tasks());
        assert_eq!(pet.breed, "");
        let id = pet.custom_tasks[0].id.clone().unwrap();
        assert!(id.as_str().starts_with("custom-"));
        assert_eq!(f.households.list_pets(&session).await.unwrap(), vec![pet]);
    }

    #[tokio::test]
    async fn custom_tasks_are_validated() {
        let f = fixture();
        let session = signed_up(&f).await;

        let mut clash = custom("Walk again", None, &[]);
        clash.id = Some(TaskId::new("walk"));
        let err = f.households.add_pet(&session, new_pet(vec![clash])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let bad_day = custom("Groom", Some(SchedulePolicy::Weekly), &[7]);
        let err = f.households.add_pet(&session, new_pet(vec![bad_day])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn pet_type_must_come_from_the_catalog() {
        let f = fixture();
        let session = signed_up(&f).await;

        let mut cat = new_pet(vec![]);
        cat.kind = " Cat".into();
        let pet = f.households.add_pet(&session, cat).await.unwrap();
        assert_eq!(pet.kind, "cat");

        let mut dragon = new_pet(vec![]);
        dragon.kind = "dragon".into();
        let err = f.households.add_pet(&session, dragon).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = f
            .households
            .update_pet(
                &session,
                &pet.id,
                PetUpdate {
                    kind: Some("unicorn".into()),
                    ..PetUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_pet_stamps_updated_at() {
        let f = fixture();
        let session = signed_up(&f).await;
        let pet = f.households.add_pet(&session, new_pet(vec![])).await.unwrap();

        let updated = f
            .households
            .update_pet(
                &session,
                &pet.id,
                PetUpdate {
                    breed: Some("Beagle".into()),
                    tasks: Some(vec![TaskId::new("walk")]),
                    ..PetUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.breed, "Beagle");
        assert_eq!(updated.tasks, vec![TaskId::new("walk")]);
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.created_at, pet.created_at);
    }

    #[tokio::test]
    async fn task_board_hides_tasks_not_due_today() {
        let f = fixture();
        let session = signed_up(&f).await;
        let pet = f
            .households
            .add_pet(
                &session,
                new_pet(vec![
                    custom("Bath", Some(SchedulePolicy::Weekly), &[1, 3, 5]),
                    custom("Nails", Some(SchedulePolicy::Weekly), &[2]),
                    custom("Never", Some(SchedulePolicy::Weekly), &[]),
                ]),
            )
            .await
            .unwrap();

        let board = f.households.task_board(&session, &pet.id).await.unwrap();

        assert_eq!(board.weekday, 2);
        let names: Vec<_> = board.tasks.iter().map(|e| e.task.name.as_str()).collect();
        assert_eq!(names, ["Morning Food", "Evening Food", "Fresh Water", "Nails"]);
        assert_eq!(board.approved_count, 0);
    }

    #[tokio::test]
    async fn toggle_uses_task_approval_flag() {
        let f = fixture();
        let mut session = signed_up(&f).await;
        let kid = f
            .households
            .add_member(
                &session,
                NewMember {
                    name: "Ava".into(),
                    avatar: None,
                    color: None,
                    is_parent: false,
                },
            )
            .await
            .unwrap();
        session.member = Some(kid);
        let mut chore = custom("Scoop litter", None, &[]);
        chore.requires_approval = true;
        let pet = f.households.add_pet(&session, new_pet(vec![chore])).await.unwrap();
        let chore_id = pet.custom_tasks[0].id.clone().unwrap();

        let pending = f
            .households
            .toggle_task(&session, &pet.id, &chore_id, None)
            .await
            .unwrap();
        assert!(!pending.completed);

        let water = f
            .households
            .toggle_task(&session, &pet.id, &TaskId::new("water"), None)
            .await
            .unwrap();
        assert!(water.completed);
        assert_eq!(f.ledger.get(&session.household_id).await.unwrap().total, 1);

        let err = f
            .households
            .toggle_task(&session, &pet.id, &TaskId::new("walk"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_a_pet_removes_its_completions() {
        let f = fixture();
        let session = signed_up(&f).await;
        let rex = f.households.add_pet(&session, new_pet(vec![])).await.unwrap();
        let tom = f.households.add_pet(&session, new_pet(vec![])).await.unwrap();
        for task in ["water", "feed-morning"] {
            f.households
                .toggle_task(&session, &rex.id, &TaskId::new(task), None)
                .await
                .unwrap();
        }
        f.households
            .toggle_task(&session, &tom.id, &TaskId::new("water"), None)
            .await
            .unwrap();

        f.households.delete_pet(&session, &rex.id).await.unwrap();

        let err = f.households.get_pet(&session, &rex.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let history = f.households.completions.history(&session.household_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].pet_id, tom.id);
        let board = f.households.task_board(&session, &tom.id).await.unwrap();
        assert_eq!(board.approved_count, 1);
        // The ledger keeps what was earned.
        assert_eq!(f.ledger.get(&session.household_id).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn deleting_a_vanished_pet_still_clears_its_completions() {
        let f = fixture();
        let session = signed_up(&f).await;
        let rex = f.households.add_pet(&session, new_pet(vec![])).await.unwrap();
        f.households
            .toggle_task(&session, &rex.id, &TaskId::new("water"), None)
            .await
            .unwrap();
        f.store.delete_pet(&session.household_id, &rex.id).await.unwrap();

        let err = f.households.delete_pet(&session, &rex.id).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        let history = f.households.completions.history(&session.household_id).await.unwrap();
        assert!(history.is_empty());
    }
}
