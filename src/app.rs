use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/today", get(handlers::get_today))
        .route("/api/households", post(handlers::sign_up))
        .route("/api/login", post(handlers::log_in))
        .route(
            "/api/members",
            get(handlers::list_members).post(handlers::add_member),
        )
        .route(
            "/api/members/:member_id",
            patch(handlers::update_member).delete(handlers::delete_member),
        )
        .route("/api/pets", get(handlers::list_pets).post(handlers::add_pet))
        .route(
            "/api/pets/:pet_id",
            get(handlers::get_pet)
                .patch(handlers::update_pet)
                .delete(handlers::delete_pet),
        )
        .route("/api/pets/:pet_id/tasks", get(handlers::task_board))
        .route(
            "/api/pets/:pet_id/tasks/:task_id/toggle",
            post(handlers::toggle_task),
        )
        .route("/api/completions/today", get(handlers::today_completions))
        .route("/api/approvals", get(handlers::pending_approvals))
        .route(
            "/api/approvals/:completion_id/approve",
            post(handlers::approve),
        )
        .route("/api/approvals/:completion_id/reject", post(handlers::reject))
        .route("/api/kindness", get(handlers::get_kindness))
        .route("/api/stats/members", get(handlers::get_member_stats))
        .route(
            "/api/stats/members/:member_id",
            get(handlers::get_stats_for_member),
        )
        .route("/api/catalog/tasks", get(handlers::get_catalog))
        .route("/api/catalog/pet-types", get(handlers::get_pet_types))
        .with_state(state)
}
