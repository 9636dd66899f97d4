//! User endpoints

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ServerState};
use crate::application::{UserLookup, UserRequest};
use crate::domain::{DATE_TIME_FORMAT, User, UserId};

#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreated {
    pub id: UserId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub mobile_number: String,
    #[serde(rename = "Joining")]
    pub joining: String,
    #[serde(rename = "Last_update")]
    pub last_update: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            middle_name: user.middle_name,
            last_name: user.last_name,
            mobile_number: user.mobile_number,
            joining: user.joined_at.format(DATE_TIME_FORMAT).to_string(),
            last_update: user.updated_at.format(DATE_TIME_FORMAT).to_string(),
        }
    }
}

pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserCreated>), ApiError> {
    let Json(request) = payload?;
    let id = state.service.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(UserCreated { id })))
}

pub async fn info(
    State(state): State<ServerState>,
    query: Result<Query<UserLookup>, QueryRejection>,
) -> Result<Json<UserView>, ApiError> {
    let Query(lookup) = query?;
    let user = state.service.find_user(lookup).await?;
    Ok(Json(user.into()))
}
