// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use divvy::application::{ExpenseRequest, ExpenseService, ParticipantRequest, UserRequest};
use divvy::domain::UserId;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(ExpenseService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = ExpenseService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Build an expense request from a JSON body, the way the HTTP layer decodes it
pub fn expense_request(body: Value) -> ExpenseRequest {
    serde_json::from_value(body).unwrap()
}

/// An equal split of `amount` between the given users, created by the first one
pub fn equal_expense(title: &str, amount: &str, date: &str, users: &[UserId]) -> ExpenseRequest {
    ExpenseRequest {
        user_id: Some(json!(users[0])),
        expense_amount: Some(json!(amount)),
        title: Some(title.into()),
        description: None,
        expense_date_time: Some(date.into()),
        split_method: Some("equal".into()),
        participants: Some(
            users
                .iter()
                .map(|id| ParticipantRequest::new(*id, None))
                .collect(),
        ),
    }
}

/// Test fixture: a small group of registered users
pub struct StandardUsers {
    pub ada: UserId,
    pub bob: UserId,
    pub cy: UserId,
}

impl StandardUsers {
    pub async fn create(service: &ExpenseService) -> Result<Self> {
        Ok(Self {
            ada: create_user(service, "ada@example.com", "Ada", "9876543210").await?,
            bob: create_user(service, "bob@example.com", "Bob", "8765432109").await?,
            cy: create_user(service, "cy@example.com", "Cy", "7654321098").await?,
        })
    }

    pub fn all(&self) -> [UserId; 3] {
        [self.ada, self.bob, self.cy]
    }
}

pub async fn create_user(
    service: &ExpenseService,
    email: &str,
    first_name: &str,
    mobile_number: &str,
) -> Result<UserId> {
    let id = service
        .create_user(UserRequest {
            email: Some(email.into()),
            first_name: Some(first_name.into()),
            middle_name: None,
            last_name: Some("Tester".into()),
            mobile_number: Some(mobile_number.into()),
        })
        .await?;
    Ok(id)
}
