//! `LeadStore` trait — backend-agnostic lead persistence.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::intake::model::LeadRecord;

/// Durable lead storage keyed by Telegram user id.
///
/// The backing store enforces uniqueness of the user id; `exists` is a
/// fast path only. Two racing first-contacts from the same user resolve at
/// `create`, where the loser gets [`StoreError::Duplicate`].
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Whether a lead already exists for this user.
    async fn exists(&self, user_id: i64) -> Result<bool, StoreError>;

    /// Look up the lead for this user.
    async fn find(&self, user_id: i64) -> Result<Option<LeadRecord>, StoreError>;

    /// Insert a new lead. All fields are written in one statement — no
    /// partial record is ever persisted.
    async fn create(&self, record: &LeadRecord) -> Result<(), StoreError>;
}
