use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{PaymentRecord, PayoutCompletionReport, ResetUnblockReport, UserAccount};

/// Common result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Structurally invalid input; reported before any transaction opens.
    #[error("payment ids are required")]
    EmptyPaymentList,
    #[error("check amount must be a positive integer")]
    InvalidCheckAmount,
    /// Data-store failure. The enclosing unit of work has been rolled back
    /// and the driver message is preserved for diagnostics.
    #[error("database error: {0}")]
    Database(String),
}

impl StorageError {
    pub fn from_source(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Payout mutations consumed by the command router.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Transitions each listed payment to `completed` and credits the
    /// owner's running payout total exactly once per payment. Each
    /// identifier commits or rolls back on its own; failures are itemized
    /// in the report rather than aborting the batch.
    async fn complete_payouts(&self, payment_ids: &[Uuid])
        -> StorageResult<PayoutCompletionReport>;

    async fn find_payment(&self, payment_id: Uuid) -> StorageResult<Option<PaymentRecord>>;
}

/// The compound rating-history repair consumed by the command router.
#[async_trait]
pub trait RatingRepairStore: Send + Sync {
    /// Reverses the user's `check_amount` most recently rated distinct
    /// photos and reactivates the account, all inside one transaction.
    async fn reset_and_unblock(
        &self,
        user_id: Uuid,
        check_amount: u32,
    ) -> StorageResult<ResetUnblockReport>;
}

/// Account lookups the router needs before invoking the repair services.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserAccount>>;
    async fn find_user_by_id(&self, user_id: Uuid) -> StorageResult<Option<UserAccount>>;
}
