use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub mobile_number: String,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user about to be registered. The id is assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub mobile_number: String,
}

/// Mobile numbers are 10 digits starting with 7, 8 or 9.
pub fn is_valid_mobile_number(number: &str) -> bool {
    let bytes = number.as_bytes();
    bytes.len() == 10
        && matches!(bytes[0], b'7'..=b'9')
        && bytes.iter().all(u8::is_ascii_digit)
}

/// Accepts `local@domain.tld` or `local@domain.tld.tld`, where the local part is
/// alphanumeric plus `.` and `-`, the domain alphanumeric plus `-`, and each TLD
/// is 2 to 8 ASCII letters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }

    let labels: Vec<&str> = host.split('.').collect();
    let (domain, tlds) = match labels.as_slice() {
        [domain, tlds @ ..] if (1..=2).contains(&tlds.len()) => (*domain, tlds),
        _ => return false,
    };

    !domain.is_empty()
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        && tlds
            .iter()
            .all(|tld| (2..=8).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic()))
}
