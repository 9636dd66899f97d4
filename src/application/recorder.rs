use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{NewExpense, ParticipantInput, SplitMethod, UserId, compute_split, parse_occurred_at};

use super::AppError;

/// An expense as submitted by a client, before any validation.
///
/// Numeric fields are kept as raw JSON values because clients send them either
/// as numbers or as strings, and a malformed value must be reported as a
/// validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseRequest {
    pub user_id: Option<Value>,
    #[serde(rename = "expenseAmount")]
    pub expense_amount: Option<Value>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub expense_date_time: Option<String>,
    pub split_method: Option<String>,
    pub participants: Option<Vec<ParticipantRequest>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipantRequest {
    pub participant_id: Option<Value>,
    pub split_value: Option<Value>,
}

impl ParticipantRequest {
    pub fn new(participant_id: impl Into<Value>, split_value: Option<Value>) -> Self {
        Self {
            participant_id: Some(participant_id.into()),
            split_value,
        }
    }
}

impl ExpenseRequest {
    /// Validate the request and compute its split.
    ///
    /// Checks run in a fixed order (required fields, timestamp, method, ids, then
    /// the split itself) and the first failure is returned. Nothing is written.
    pub fn validate(self, now: NaiveDateTime) -> Result<NewExpense, AppError> {
        let (Some(user_id), Some(amount), Some(title), Some(method), Some(participants)) = (
            self.user_id.filter(|v| !is_blank(v)),
            self.expense_amount,
            self.title.filter(|t| !t.is_empty()),
            self.split_method.filter(|m| !m.is_empty()),
            self.participants,
        ) else {
            return Err(AppError::MissingFields(
                "Required fields are missing".to_string(),
            ));
        };

        if participants.is_empty() {
            return Err(AppError::MissingFields(
                "At least one participant is required".to_string(),
            ));
        }

        let occurred_at = match self.expense_date_time.as_deref() {
            Some(raw) if !raw.is_empty() => parse_occurred_at(raw, now)?,
            _ => now,
        };

        let split_method =
            SplitMethod::from_str(&method).ok_or_else(|| AppError::InvalidMethod(method.clone()))?;

        let creator = parse_id(&user_id).ok_or_else(|| AppError::InvalidUserId(user_id.to_string()))?;

        let inputs = participants
            .into_iter()
            .map(|p| {
                let participant_id = p
                    .participant_id
                    .as_ref()
                    .and_then(parse_id)
                    .ok_or_else(|| {
                        AppError::InvalidParticipant(
                            p.participant_id
                                .as_ref()
                                .map_or_else(|| "missing".to_string(), Value::to_string),
                        )
                    })?;
                Ok(ParticipantInput::new(
                    participant_id,
                    p.split_value.as_ref().and_then(scalar_text),
                ))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let shares = compute_split(
            &scalar_text(&amount).unwrap_or_default(),
            split_method,
            creator,
            &inputs,
        )?;

        Ok(NewExpense {
            title,
            description: self.description,
            occurred_at,
            split_method,
            created_by: creator,
            shares,
        })
    }
}

/// Text form of a number or string value. Other JSON types are rendered as-is so
/// they fail decimal parsing downstream; null has no text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Integer ids may arrive as JSON integers or numeric strings.
fn parse_id(value: &Value) -> Option<UserId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Values a client uses to mean "not provided".
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}
