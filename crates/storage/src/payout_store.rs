use chrono::Utc;
use metrics::counter;
use ratedesk_domain::model::{
    CompletionSummary, PaymentDisposition, PaymentOutcome, PaymentRecord, PaymentStatus,
    PayoutCompletionReport,
};
use ratedesk_domain::storage::{PayoutStore, StorageError, StorageResult};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, EntityTrait, Set, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{
    payments::{self, PaymentStatusDb},
    users,
};
use crate::SeaOrmStorage;

#[async_trait::async_trait]
impl PayoutStore for SeaOrmStorage {
    async fn complete_payouts(
        &self,
        payment_ids: &[Uuid],
    ) -> StorageResult<PayoutCompletionReport> {
        if payment_ids.is_empty() {
            return Err(StorageError::EmptyPaymentList);
        }

        let mut outcomes = Vec::with_capacity(payment_ids.len());
        for &payment_id in payment_ids {
            let disposition = match self.complete_single(payment_id).await {
                Ok(disposition) => disposition,
                Err(err) => {
                    warn!(%payment_id, error = %err, "payout completion failed");
                    PaymentDisposition::Error {
                        message: err.to_string(),
                    }
                }
            };
            counter!("payout_outcomes_total", "outcome" => outcome_label(&disposition))
                .increment(1);
            outcomes.push(PaymentOutcome {
                payment_id,
                disposition,
            });
        }

        let summary = CompletionSummary::tally(&outcomes);
        info!(
            total = summary.total,
            completed = summary.completed,
            not_found = summary.not_found,
            errors = summary.errors,
            "payout batch processed"
        );
        Ok(PayoutCompletionReport { outcomes, summary })
    }

    async fn find_payment(&self, payment_id: Uuid) -> StorageResult<Option<PaymentRecord>> {
        let maybe = payments::Entity::find_by_id(payment_id)
            .one(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(maybe.map(payment_to_record))
    }
}

impl SeaOrmStorage {
    /// One payment, one transaction: a failure here must not disturb the
    /// other identifiers in the batch.
    async fn complete_single(&self, payment_id: Uuid) -> StorageResult<PaymentDisposition> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(StorageError::from_source)?;
        match complete_in_txn(&txn, payment_id).await {
            Ok(disposition) => {
                txn.commit().await.map_err(StorageError::from_source)?;
                Ok(disposition)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(%payment_id, error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

async fn complete_in_txn(
    txn: &DatabaseTransaction,
    payment_id: Uuid,
) -> StorageResult<PaymentDisposition> {
    let Some(payment) = payments::Entity::find_by_id(payment_id)
        .one(txn)
        .await
        .map_err(StorageError::from_source)?
    else {
        return Ok(PaymentDisposition::NotFound);
    };

    let was_already_completed = payment.status == PaymentStatusDb::Completed;
    let owner_id = payment.user_id;
    let amount = payment.amount;
    let now = Utc::now();

    // Deliberate idempotent overwrite: status and processed_at are stamped
    // even when the row was already completed.
    let mut payout: payments::ActiveModel = payment.into();
    payout.status = Set(PaymentStatusDb::Completed);
    payout.processed_at = Set(Some(now));
    payout.updated_at = Set(now);
    payout.update(txn).await.map_err(StorageError::from_source)?;

    // The payout credit happens at most once per payment, gated on the
    // status observed inside this same transaction.
    if !was_already_completed {
        match users::Entity::find_by_id(owner_id)
            .one(txn)
            .await
            .map_err(StorageError::from_source)?
        {
            Some(owner) => {
                let new_total = owner.total_paid_out + amount;
                let mut account: users::ActiveModel = owner.into();
                account.total_paid_out = Set(new_total);
                account.updated_at = Set(now);
                account.update(txn).await.map_err(StorageError::from_source)?;
            }
            None => {
                warn!(%payment_id, user_id = %owner_id, "payment owner missing, payout credit skipped");
            }
        }
    }

    Ok(PaymentDisposition::Completed {
        was_already_completed,
    })
}

fn outcome_label(disposition: &PaymentDisposition) -> &'static str {
    match disposition {
        PaymentDisposition::Completed {
            was_already_completed: true,
        } => "already_completed",
        PaymentDisposition::Completed { .. } => "completed",
        PaymentDisposition::NotFound => "not_found",
        PaymentDisposition::Error { .. } => "error",
    }
}

fn payment_to_record(model: payments::Model) -> PaymentRecord {
    PaymentRecord {
        id: model.id,
        user_id: model.user_id,
        amount: model.amount,
        net_amount: model.net_amount,
        transfer_fee: model.transfer_fee,
        status: status_from_db(&model.status),
        paypal_email: model.paypal_email,
        paypal_transaction_id: model.paypal_transaction_id,
        error_message: model.error_message,
        processed_at: model.processed_at,
        created_at: model.created_at,
    }
}

fn status_from_db(status: &PaymentStatusDb) -> PaymentStatus {
    match status {
        PaymentStatusDb::Pending => PaymentStatus::Pending,
        PaymentStatusDb::Processing => PaymentStatus::Processing,
        PaymentStatusDb::Completed => PaymentStatus::Completed,
        PaymentStatusDb::Failed => PaymentStatus::Failed,
        PaymentStatusDb::Cancelled => PaymentStatus::Cancelled,
        PaymentStatusDb::RetryPending => PaymentStatus::RetryPending,
        PaymentStatusDb::Unclaimed => PaymentStatus::Unclaimed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, money, payment_fixture, storage, user_fixture};
    use sea_orm::{ConnectionTrait, Statement};

    #[tokio::test]
    async fn completes_and_credits_owner() {
        let storage = storage().await;
        let db = storage.connection();
        let mut user = user_fixture("rater@example.com");
        user.total_paid_out = Set(money("10.00"));
        let user = user.insert(db).await.unwrap();
        let payment = payment_fixture(user.id, "25.50", PaymentStatusDb::Processing)
            .insert(db)
            .await
            .unwrap();

        let report = storage.complete_payouts(&[payment.id]).await.unwrap();
        assert_eq!(report.summary.total, 1);
        assert_eq!(report.summary.completed, 1);
        assert_eq!(
            report.outcomes[0].disposition,
            PaymentDisposition::Completed {
                was_already_completed: false
            }
        );

        let payment = payments::Entity::find_by_id(payment.id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatusDb::Completed);
        assert!(payment.processed_at.is_some());

        let account = users::Entity::find_by_id(user.id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.total_paid_out, money("35.50"));
    }

    #[tokio::test]
    async fn repeated_completion_credits_once() {
        let storage = storage().await;
        let db = storage.connection();
        let user = user_fixture("rater@example.com").insert(db).await.unwrap();
        let payment = payment_fixture(user.id, "5.00", PaymentStatusDb::Pending)
            .insert(db)
            .await
            .unwrap();

        let first = storage.complete_payouts(&[payment.id]).await.unwrap();
        let second = storage.complete_payouts(&[payment.id]).await.unwrap();
        assert_eq!(
            first.outcomes[0].disposition,
            PaymentDisposition::Completed {
                was_already_completed: false
            }
        );
        assert_eq!(
            second.outcomes[0].disposition,
            PaymentDisposition::Completed {
                was_already_completed: true
            }
        );

        let account = users::Entity::find_by_id(user.id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.total_paid_out, money("5.00"));

        let payment = payments::Entity::find_by_id(payment.id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert!(payment.processed_at.is_some());
    }

    #[tokio::test]
    async fn missing_payments_do_not_abort_the_batch() {
        let storage = storage().await;
        let db = storage.connection();
        let user = user_fixture("rater@example.com").insert(db).await.unwrap();
        let first = payment_fixture(user.id, "1.00", PaymentStatusDb::Pending)
            .insert(db)
            .await
            .unwrap();
        let second = payment_fixture(user.id, "2.00", PaymentStatusDb::Pending)
            .insert(db)
            .await
            .unwrap();
        let missing = Uuid::new_v4();

        let report = storage
            .complete_payouts(&[first.id, missing, second.id])
            .await
            .unwrap();

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.completed, 2);
        assert_eq!(report.summary.not_found, 1);
        assert_eq!(report.summary.errors, 0);
        assert_eq!(report.outcomes[1].payment_id, missing);
        assert_eq!(report.outcomes[1].disposition, PaymentDisposition::NotFound);

        let account = users::Entity::find_by_id(user.id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.total_paid_out, money("3.00"));
    }

    #[tokio::test]
    async fn duplicate_ids_observe_committed_state() {
        let storage = storage().await;
        let db = storage.connection();
        let user = user_fixture("rater@example.com").insert(db).await.unwrap();
        let payment = payment_fixture(user.id, "4.00", PaymentStatusDb::Pending)
            .insert(db)
            .await
            .unwrap();

        let report = storage
            .complete_payouts(&[payment.id, payment.id])
            .await
            .unwrap();

        assert_eq!(
            report.outcomes[0].disposition,
            PaymentDisposition::Completed {
                was_already_completed: false
            }
        );
        assert_eq!(
            report.outcomes[1].disposition,
            PaymentDisposition::Completed {
                was_already_completed: true
            }
        );

        let account = users::Entity::find_by_id(user.id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.total_paid_out, money("4.00"));
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let storage = storage().await;
        let err = storage.complete_payouts(&[]).await.unwrap_err();
        assert_eq!(err, StorageError::EmptyPaymentList);
    }

    #[tokio::test]
    async fn unknown_status_fails_loudly() {
        let storage = storage().await;
        let db = storage.connection();
        let user = user_fixture("rater@example.com").insert(db).await.unwrap();

        // Bypass the typed entity to plant a status string no variant names.
        let payment_id = Uuid::new_v4();
        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            "INSERT INTO payments (id, user_id, amount, paypal_email, status, kind, \
             transfer_fee, net_amount, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            [
                payment_id.into(),
                user.id.into(),
                money("5.00").into(),
                "payout@example.com".into(),
                "refunded".into(),
                "cashout".into(),
                money("0.25").into(),
                money("4.75").into(),
                at(0, 0).into(),
                at(0, 0).into(),
            ],
        ))
        .await
        .unwrap();

        let report = storage.complete_payouts(&[payment_id]).await.unwrap();
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.completed, 0);
        let PaymentDisposition::Error { message } = &report.outcomes[0].disposition else {
            panic!("expected error outcome, got {:?}", report.outcomes[0]);
        };
        assert!(!message.is_empty());

        let account = users::Entity::find_by_id(user.id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.total_paid_out, money("0.00"));
    }

    #[tokio::test]
    async fn missing_owner_still_completes() {
        let storage = storage().await;
        let db = storage.connection();
        let payment = payment_fixture(Uuid::new_v4(), "9.99", PaymentStatusDb::Pending)
            .insert(db)
            .await
            .unwrap();

        let report = storage.complete_payouts(&[payment.id]).await.unwrap();
        assert_eq!(report.summary.completed, 1);

        let payment = payments::Entity::find_by_id(payment.id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.status, PaymentStatusDb::Completed);
    }

    #[tokio::test]
    async fn find_payment_maps_the_record() {
        let storage = storage().await;
        let db = storage.connection();
        let user = user_fixture("rater@example.com").insert(db).await.unwrap();
        let payment = payment_fixture(user.id, "7.50", PaymentStatusDb::RetryPending)
            .insert(db)
            .await
            .unwrap();

        let record = storage.find_payment(payment.id).await.unwrap().unwrap();
        assert_eq!(record.id, payment.id);
        assert_eq!(record.user_id, user.id);
        assert_eq!(record.amount, money("7.50"));
        assert_eq!(record.net_amount, money("7.25"));
        assert_eq!(record.status, PaymentStatus::RetryPending);
        assert!(record.processed_at.is_none());

        assert_eq!(storage.find_payment(Uuid::new_v4()).await.unwrap(), None);
    }
}
