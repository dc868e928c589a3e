//! Data structures shared between the storage adapter and the command
//! router that renders them for operators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle states of a payout row. Stored lowercase in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    RetryPending,
    Unclaimed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::RetryPending => "retry_pending",
            Self::Unclaimed => "unclaimed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a status string does not name a known variant. Unknown
/// values are a hard error, never coerced to a default.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown payment status `{0}`")]
pub struct UnknownPaymentStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "retry_pending" => Ok(Self::RetryPending),
            "unclaimed" => Ok(Self::Unclaimed),
            other => Err(UnknownPaymentStatus(other.to_owned())),
        }
    }
}

/// A platform user account as seen by operator tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub current_earnings: Decimal,
    pub lifetime_earnings: Decimal,
    pub total_paid_out: Decimal,
    pub is_active: bool,
    pub total_photos_rated: i32,
    pub photos_rated_in_current_batch: i32,
    pub ratings_in_current_period: i32,
}

/// A payout row as seen by operator tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub net_amount: Decimal,
    pub transfer_fee: Decimal,
    pub status: PaymentStatus,
    pub paypal_email: String,
    pub paypal_transaction_id: Option<String>,
    pub error_message: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// What happened to one payment identifier within a completion batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentDisposition {
    /// The row is now `completed`. `was_already_completed` is true when the
    /// call found it completed and therefore skipped the payout credit.
    Completed { was_already_completed: bool },
    NotFound,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentOutcome {
    pub payment_id: Uuid,
    #[serde(flatten)]
    pub disposition: PaymentDisposition,
}

/// Aggregate counts over one completion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    pub total: usize,
    pub completed: usize,
    pub not_found: usize,
    pub errors: usize,
}

impl CompletionSummary {
    pub fn tally(outcomes: &[PaymentOutcome]) -> Self {
        let mut summary = Self {
            total: outcomes.len(),
            completed: 0,
            not_found: 0,
            errors: 0,
        };
        for outcome in outcomes {
            match outcome.disposition {
                PaymentDisposition::Completed { .. } => summary.completed += 1,
                PaymentDisposition::NotFound => summary.not_found += 1,
                PaymentDisposition::Error { .. } => summary.errors += 1,
            }
        }
        summary
    }
}

impl fmt::Display for CompletionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} payment(s). {} completed, {} not found, {} errors.",
            self.total, self.completed, self.not_found, self.errors
        )
    }
}

/// Itemized result of a completion batch. Partial per-item failure does not
/// fail the batch; callers must inspect `outcomes`/`summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayoutCompletionReport {
    pub outcomes: Vec<PaymentOutcome>,
    pub summary: CompletionSummary,
}

/// Result of a reset-unblock call. `UserNotFound` and `NothingToReset` are
/// informational read-only outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResetUnblockReport {
    UserNotFound,
    NothingToReset,
    Reversed(ResetSummary),
}

/// What a committed reset-unblock actually undid. `photo_ids` carries the
/// full affected set, most recently rated first; truncation for display is
/// the caller's business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetSummary {
    pub photos_affected: usize,
    pub earnings_subtracted: Decimal,
    pub ratings_deleted: u64,
    pub photo_ids: Vec<Uuid>,
}

/// Subtracts `amount` from `balance`, clamping at zero. Repair operations
/// must never drive earnings or counters negative.
pub fn subtract_to_floor(balance: Decimal, amount: Decimal) -> Decimal {
    (balance - amount).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        let all = [
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
            PaymentStatus::RetryPending,
            PaymentStatus::Unclaimed,
        ];
        for status in all {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "refunded".parse::<PaymentStatus>().unwrap_err();
        assert_eq!(err, UnknownPaymentStatus("refunded".into()));
        assert!("".parse::<PaymentStatus>().is_err());
        assert!("COMPLETED".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn summary_tallies_dispositions() {
        let outcomes = vec![
            PaymentOutcome {
                payment_id: Uuid::new_v4(),
                disposition: PaymentDisposition::Completed {
                    was_already_completed: false,
                },
            },
            PaymentOutcome {
                payment_id: Uuid::new_v4(),
                disposition: PaymentDisposition::NotFound,
            },
            PaymentOutcome {
                payment_id: Uuid::new_v4(),
                disposition: PaymentDisposition::Completed {
                    was_already_completed: true,
                },
            },
        ];
        let summary = CompletionSummary::tally(&outcomes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.errors, 0);
        assert_eq!(
            summary.to_string(),
            "Processed 3 payment(s). 2 completed, 1 not found, 0 errors."
        );
    }

    #[test]
    fn subtraction_clamps_at_zero() {
        let balance: Decimal = "0.30".parse().unwrap();
        let amount: Decimal = "0.50".parse().unwrap();
        assert_eq!(subtract_to_floor(balance, amount), Decimal::ZERO);
        assert_eq!(
            subtract_to_floor(amount, balance),
            "0.20".parse::<Decimal>().unwrap()
        );
        assert_eq!(subtract_to_floor(balance, Decimal::ZERO), balance);
    }
}
