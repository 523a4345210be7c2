use crate::catalog::{BUILTIN_TASKS, CatalogTask, PET_TYPES, PetType};
use crate::clock::DayKey;
use crate::errors::AppError;
use crate::models::{
    CompletionRecord, HouseholdResponse, KindnessResponse, LoginRequest, Member, MemberId,
    MemberStats, MemberUpdate, NewMember, NewPet, Pet, PetId, PetUpdate, SignUpRequest, TaskBoard,
    TaskId, TodayResponse, ToggleRequest, ToggleResponse,
};
use crate::session::Session;
use crate::state::AppState;
use crate::stats::{build_member_stats_at, member_stats_for};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::collections::BTreeMap;

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    let today = DayKey::today(state.clock.as_ref());
    Json(TodayResponse {
        date: today.to_string(),
        weekday: today.weekday(),
    })
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<HouseholdResponse>), AppError> {
    let household = state.households.sign_up(payload).await?;
    Ok((StatusCode::CREATED, Json(household)))
}

pub async fn log_in(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<HouseholdResponse>, AppError> {
    Ok(Json(state.households.log_in(payload).await?))
}

pub async fn list_members(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Member>>, AppError> {
    Ok(Json(state.households.list_members(&session).await?))
}

pub async fn add_member(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<NewMember>,
) -> Result<(StatusCode, Json<Member>), AppError> {
    let member = state.households.add_member(&session, payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(state): State<AppState>,
    session: Session,
    Path(member_id): Path<String>,
    Json(payload): Json<MemberUpdate>,
) -> Result<Json<Member>, AppError> {
    let member = state
        .households
        .update_member(&session, &MemberId::new(member_id), payload)
        .await?;
    Ok(Json(member))
}

pub async fn delete_member(
    State(state): State<AppState>,
    session: Session,
    Path(member_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .households
        .delete_member(&session, &MemberId::new(member_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_pets(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Pet>>, AppError> {
    Ok(Json(state.households.list_pets(&session).await?))
}

pub async fn add_pet(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<NewPet>,
) -> Result<(StatusCode, Json<Pet>), AppError> {
    let pet = state.households.add_pet(&session, payload).await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

pub async fn get_pet(
    State(state): State<AppState>,
    session: Session,
    Path(pet_id): Path<String>,
) -> Result<Json<Pet>, AppError> {
    Ok(Json(
        state.households.get_pet(&session, &PetId::new(pet_id)).await?,
    ))
}

pub async fn update_pet(
    State(state): State<AppState>,
    session: Session,
    Path(pet_id): Path<String>,
    Json(payload): Json<PetUpdate>,
) -> Result<Json<Pet>, AppError> {
    let pet = state
        .households
        .update_pet(&session, &PetId::new(pet_id), payload)
        .await?;
    Ok(Json(pet))
}

pub async fn delete_pet(
    State(state): State<AppState>,
    session: Session,
    Path(pet_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .households
        .delete_pet(&session, &PetId::new(pet_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn task_board(
    State(state): State<AppState>,
    session: Session,
    Path(pet_id): Path<String>,
) -> Result<Json<TaskBoard>, AppError> {
    Ok(Json(
        state
            .households
            .task_board(&session, &PetId::new(pet_id))
            .await?,
    ))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    session: Session,
    Path((pet_id, task_id)): Path<(String, String)>,
    payload: Option<Json<ToggleRequest>>,
) -> Result<Json<ToggleResponse>, AppError> {
    let requires_approval = payload.and_then(|Json(body)| body.requires_approval);
    let outcome = state
        .households
        .toggle_task(
            &session,
            &PetId::new(pet_id),
            &TaskId::new(task_id),
            requires_approval,
        )
        .await?;
    Ok(Json(outcome))
}

pub async fn today_completions(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<CompletionRecord>>, AppError> {
    Ok(Json(
        state
            .completions
            .today_records(&session.household_id)
            .await?,
    ))
}

pub async fn pending_approvals(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<CompletionRecord>>, AppError> {
    Ok(Json(
        state
            .completions
            .pending_approvals(&session.household_id)
            .await?,
    ))
}

pub async fn approve(
    State(state): State<AppState>,
    session: Session,
    Path(completion_id): Path<String>,
) -> Result<Json<CompletionRecord>, AppError> {
    Ok(Json(
        state.completions.approve(&session, &completion_id).await?,
    ))
}

pub async fn reject(
    State(state): State<AppState>,
    session: Session,
    Path(completion_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.completions.reject(&session, &completion_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_kindness(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<KindnessResponse>, AppError> {
    let today = state.completions.today();
    Ok(Json(state.ledger.summary(&session.household_id, today).await?))
}

pub async fn get_member_stats(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<BTreeMap<MemberId, MemberStats>>, AppError> {
    let records = state.completions.history(&session.household_id).await?;
    Ok(Json(build_member_stats_at(
        state.completions.today(),
        &records,
    )))
}

pub async fn get_stats_for_member(
    State(state): State<AppState>,
    session: Session,
    Path(member_id): Path<String>,
) -> Result<Json<MemberStats>, AppError> {
    let records = state.completions.history(&session.household_id).await?;
    Ok(Json(member_stats_for(
        state.completions.today(),
        &records,
        &MemberId::new(member_id),
    )))
}

pub async fn get_catalog() -> Json<&'static [CatalogTask]> {
    Json(BUILTIN_TASKS)
}

pub async fn get_pet_types() -> Json<&'static [PetType]> {
    Json(PET_TYPES)
}
