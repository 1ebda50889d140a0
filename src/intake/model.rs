//! Lead record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile fields collected from a candidate.
///
/// `Basic` comes from the single-message quick form, `Extended` from the
/// guided dialogue. All text fields are trimmed and non-empty; age is
/// within the validator's range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeadProfile {
    Basic {
        city: String,
        age: u8,
    },
    Extended {
        name: String,
        age: u8,
        workplace: String,
        citizenship: String,
    },
}

impl LeadProfile {
    pub fn age(&self) -> u8 {
        match self {
            Self::Basic { age, .. } | Self::Extended { age, .. } => *age,
        }
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        match self {
            Self::Basic { city, age } => format!("{city}, {age}"),
            Self::Extended {
                name,
                age,
                workplace,
                citizenship,
            } => format!("{name}, {age}, {workplace}, {citizenship}"),
        }
    }
}

/// A persisted lead. Created exactly once per Telegram user id, never
/// updated or deleted by this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// Internal record id.
    pub id: Uuid,
    /// Telegram user id. Unique across the store.
    pub user_id: i64,
    /// Telegram username at registration time, if the user has one.
    pub username: Option<String>,
    pub profile: LeadProfile,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
}

impl LeadRecord {
    pub fn new(user_id: i64, username: Option<String>, profile: LeadProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            username,
            profile,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_age_both_variants() {
        let basic = LeadProfile::Basic {
            city: "Oslo".into(),
            age: 30,
        };
        let extended = LeadProfile::Extended {
            name: "Jon".into(),
            age: 17,
            workplace: "Dock".into(),
            citizenship: "Norway".into(),
        };
        assert_eq!(basic.age(), 30);
        assert_eq!(extended.age(), 17);
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = LeadRecord::new(
            42,
            Some("jon_doe".into()),
            LeadProfile::Basic {
                city: "Bergen".into(),
                age: 25,
            },
        );
        let json = serde_json::to_string(&record).unwrap();
        let parsed: LeadRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
