use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FULL_PERCENT, Millis, UserId, format_millis, parse_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    /// Everyone owes the same share
    Equal,
    /// Each participant states the amount they owe
    Exact,
    /// Each participant states the percentage of the total they owe
    Percentage,
}

impl SplitMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMethod::Equal => "equal",
            SplitMethod::Exact => "exact",
            SplitMethod::Percentage => "percentage",
        }
    }

    /// Parse a method name. Matching is exact: "Equal" is not a valid method.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "equal" => Some(SplitMethod::Equal),
            "exact" => Some(SplitMethod::Exact),
            "percentage" => Some(SplitMethod::Percentage),
            _ => None,
        }
    }

    /// Whether the participants' split values are read by this method.
    pub fn uses_split_values(&self) -> bool {
        !matches!(self, SplitMethod::Equal)
    }
}

impl std::fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One participant as submitted, before any split is computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInput {
    pub participant_id: UserId,
    /// Raw decimal text. Ignored by the equal method.
    pub split_value: Option<String>,
}

impl ParticipantInput {
    pub fn new(participant_id: UserId, split_value: Option<String>) -> Self {
        Self {
            participant_id,
            split_value,
        }
    }
}

/// A participant's computed obligation for one expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub participant_id: UserId,
    pub amount: Millis,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("At least one participant is required")]
    NoParticipants,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid split value for participant {participant_id}: {reason}")]
    InvalidParticipant { participant_id: UserId, reason: String },

    #[error("The creator of the expense must participate")]
    CreatorNotParticipant { creator: UserId },

    #[error("Duplicate participant ID {0} is not allowed")]
    DuplicateParticipant(UserId),

    #[error("Total percentage split must equal 100%, not {}%", display_millis(.actual))]
    PercentageMismatch { actual: Millis },

    #[error("Total exact amounts must equal the total expense amount of {}", display_millis(.expected))]
    ExactAmountMismatch { expected: Millis, actual: Millis },

    #[error("The amount is too small to be split")]
    AmountTooSmall,
}

fn display_millis(millis: &Millis) -> String {
    format_millis(*millis)
}

/// Split `total` between `participants` according to `method`.
///
/// All arithmetic happens in millis. Shares are truncated to 3 decimal places and
/// the truncation residual goes to the participant with the smallest share (the
/// first one in input order on ties), so the returned shares always sum to the
/// total exactly.
pub fn compute_split(
    total: &str,
    method: SplitMethod,
    creator: UserId,
    participants: &[ParticipantInput],
) -> Result<Vec<Share>, SplitError> {
    if participants.is_empty() {
        return Err(SplitError::NoParticipants);
    }

    let total = parse_millis(total).map_err(|_| {
        SplitError::InvalidAmount(
            "Please enter a positive number with up to 10 digits and up to 3 decimal places"
                .to_string(),
        )
    })?;
    if total <= 0 {
        return Err(SplitError::InvalidAmount(
            "Negative or zero amount is not allowed".to_string(),
        ));
    }

    let values = if method.uses_split_values() {
        participants
            .iter()
            .map(|p| parse_split_value(p, method))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    if !participants.iter().any(|p| p.participant_id == creator) {
        return Err(SplitError::CreatorNotParticipant { creator });
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        if !seen.insert(participant.participant_id) {
            return Err(SplitError::DuplicateParticipant(participant.participant_id));
        }
    }

    let amounts = match method {
        SplitMethod::Equal => split_equal(total, participants.len())?,
        SplitMethod::Percentage => split_percentage(total, &values)?,
        SplitMethod::Exact => split_exact(total, values)?,
    };

    Ok(participants
        .iter()
        .zip(amounts)
        .map(|(p, amount)| Share {
            participant_id: p.participant_id,
            amount,
        })
        .collect())
}

fn parse_split_value(
    participant: &ParticipantInput,
    method: SplitMethod,
) -> Result<Millis, SplitError> {
    let invalid = |reason: &str| SplitError::InvalidParticipant {
        participant_id: participant.participant_id,
        reason: reason.to_string(),
    };

    let raw = participant
        .split_value
        .as_deref()
        .ok_or_else(|| invalid("split value is required"))?;
    let value = parse_millis(raw).map_err(|e| invalid(&e.to_string()))?;

    if value <= 0 {
        return Err(invalid("split value must be positive"));
    }
    if method == SplitMethod::Percentage && value > FULL_PERCENT {
        return Err(invalid(
            "split value cannot exceed 100% while using percentage split method",
        ));
    }
    Ok(value)
}

fn split_equal(total: Millis, count: usize) -> Result<Vec<Millis>, SplitError> {
    let count = count as Millis;
    let share = total / count;
    if share * count <= 0 {
        return Err(SplitError::AmountTooSmall);
    }

    let mut amounts = vec![share; count as usize];
    absorb_residual(&mut amounts, total);
    Ok(amounts)
}

fn split_percentage(total: Millis, percentages: &[Millis]) -> Result<Vec<Millis>, SplitError> {
    let sum: Millis = percentages.iter().sum();
    if sum != FULL_PERCENT {
        return Err(SplitError::PercentageMismatch { actual: sum });
    }

    let mut amounts = Vec::with_capacity(percentages.len());
    for &pct in percentages {
        // total <= 10^13 and pct <= 10^5, widen before multiplying
        let share = (i128::from(total) * i128::from(pct) / i128::from(FULL_PERCENT)) as Millis;
        if share <= 0 {
            return Err(SplitError::AmountTooSmall);
        }
        amounts.push(share);
    }

    absorb_residual(&mut amounts, total);
    Ok(amounts)
}

fn split_exact(total: Millis, amounts: Vec<Millis>) -> Result<Vec<Millis>, SplitError> {
    let sum: Millis = amounts.iter().sum();
    if sum != total {
        return Err(SplitError::ExactAmountMismatch {
            expected: total,
            actual: sum,
        });
    }
    Ok(amounts)
}

/// Give `total - sum(amounts)` to the smallest amount, first occurrence on ties.
fn absorb_residual(amounts: &mut [Millis], total: Millis) {
    let residual = total - amounts.iter().sum::<Millis>();
    let smallest = amounts
        .iter()
        .enumerate()
        .min_by_key(|&(index, &amount)| (amount, index))
        .map(|(index, _)| index);

    if let Some(index) = smallest {
        amounts[index] += residual;
    }
}
