use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::AppError;
use crate::models::{HouseholdId, Member, MemberId};
use crate::state::AppState;

pub const HOUSEHOLD_HEADER: &str = "x-household-id";
pub const MEMBER_HEADER: &str = "x-member-id";

#[derive(Debug, Clone)]
pub struct Session {
    pub household_id: HouseholdId,
    pub member: Option<Member>,
}

impl Session {
    pub fn is_parent(&self) -> bool {
        self.member.as_ref().is_some_and(|member| member.is_parent)
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let household_id = header(parts, HOUSEHOLD_HEADER)
            .map(HouseholdId::new)
            .ok_or(AppError::NotLoggedIn)?;
        let member_id = header(parts, MEMBER_HEADER).map(MemberId::new);
        state
            .households
            .resolve_session(household_id, member_id.as_ref())
            .await
    }
}
