use chrono::{DateTime, Utc};
use metrics::counter;
use ratedesk_domain::model::{subtract_to_floor, ResetSummary, ResetUnblockReport};
use ratedesk_domain::storage::{RatingRepairStore, StorageError, StorageResult};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{photos, ratings, users};
use crate::SeaOrmStorage;

#[async_trait::async_trait]
impl RatingRepairStore for SeaOrmStorage {
    async fn reset_and_unblock(
        &self,
        user_id: Uuid,
        check_amount: u32,
    ) -> StorageResult<ResetUnblockReport> {
        if check_amount == 0 {
            return Err(StorageError::InvalidCheckAmount);
        }

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(StorageError::from_source)?;
        let report = match apply_reset(&txn, user_id, check_amount).await {
            Ok(report) => report,
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(%user_id, error = %rollback_err, "rollback failed");
                }
                counter!("reset_unblock_total", "outcome" => "error").increment(1);
                return Err(err);
            }
        };
        txn.commit().await.map_err(StorageError::from_source)?;

        match &report {
            ResetUnblockReport::UserNotFound => {
                counter!("reset_unblock_total", "outcome" => "user_not_found").increment(1);
            }
            ResetUnblockReport::NothingToReset => {
                counter!("reset_unblock_total", "outcome" => "nothing_to_reset").increment(1);
            }
            ResetUnblockReport::Reversed(summary) => {
                counter!("reset_unblock_total", "outcome" => "reversed").increment(1);
                info!(
                    %user_id,
                    photos_affected = summary.photos_affected,
                    earnings_subtracted = %summary.earnings_subtracted,
                    ratings_deleted = summary.ratings_deleted,
                    "reset-unblock applied"
                );
            }
        }
        Ok(report)
    }
}

/// Runs every repair step inside the caller's transaction; nothing commits
/// here. Ordering matters: the photo aggregates are recomputed after the
/// deletions so they observe them.
async fn apply_reset(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    check_amount: u32,
) -> StorageResult<ResetUnblockReport> {
    let Some(user) = users::Entity::find_by_id(user_id)
        .one(txn)
        .await
        .map_err(StorageError::from_source)?
    else {
        return Ok(ResetUnblockReport::UserNotFound);
    };

    let photo_ids = affected_photo_ids(txn, user_id, check_amount).await?;
    if photo_ids.is_empty() {
        return Ok(ResetUnblockReport::NothingToReset);
    }
    let photos_affected = photo_ids.len();

    // Only positive credits are reversed; the deletion below is
    // unconditional on photo membership. Summed in Decimal arithmetic to
    // keep the monetary math exact on every backend.
    let positive_earnings: Vec<Decimal> = ratings::Entity::find()
        .select_only()
        .column(ratings::Column::Earnings)
        .filter(ratings::Column::UserId.eq(user_id))
        .filter(ratings::Column::PhotoId.is_in(photo_ids.clone()))
        .filter(ratings::Column::Earnings.gt(Decimal::ZERO))
        .into_tuple()
        .all(txn)
        .await
        .map_err(StorageError::from_source)?;
    let earnings_subtracted: Decimal = positive_earnings.into_iter().sum();

    let now = Utc::now();
    let current_earnings = subtract_to_floor(user.current_earnings, earnings_subtracted);
    let lifetime_earnings = subtract_to_floor(user.lifetime_earnings, earnings_subtracted);
    let total_photos_rated = (user.total_photos_rated - photos_affected as i32).max(0);

    let mut account: users::ActiveModel = user.into();
    account.current_earnings = Set(current_earnings);
    account.lifetime_earnings = Set(lifetime_earnings);
    account.is_active = Set(true);
    account.total_photos_rated = Set(total_photos_rated);
    account.photos_rated_in_current_batch = Set(0);
    account.ratings_in_current_period = Set(0);
    account.updated_at = Set(now);
    account.update(txn).await.map_err(StorageError::from_source)?;

    let deleted = ratings::Entity::delete_many()
        .filter(ratings::Column::UserId.eq(user_id))
        .filter(ratings::Column::PhotoId.is_in(photo_ids.clone()))
        .exec(txn)
        .await
        .map_err(StorageError::from_source)?;

    for &photo_id in &photo_ids {
        recompute_photo_aggregates(txn, photo_id, now).await?;
    }

    Ok(ResetUnblockReport::Reversed(ResetSummary {
        photos_affected,
        earnings_subtracted,
        ratings_deleted: deleted.rows_affected,
        photo_ids,
    }))
}

/// The user's distinct rated photos, most recent rating session first,
/// capped at `check_amount`. Fewer than requested is not an error.
async fn affected_photo_ids(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    check_amount: u32,
) -> StorageResult<Vec<Uuid>> {
    let groups: Vec<(Uuid, DateTime<Utc>)> = ratings::Entity::find()
        .select_only()
        .column(ratings::Column::PhotoId)
        .column_as(ratings::Column::StartTime.max(), "last_rated_at")
        .filter(ratings::Column::UserId.eq(user_id))
        .group_by(ratings::Column::PhotoId)
        .order_by_desc(ratings::Column::StartTime.max())
        .limit(check_amount as u64)
        .into_tuple()
        .all(txn)
        .await
        .map_err(StorageError::from_source)?;
    Ok(groups.into_iter().map(|(photo_id, _)| photo_id).collect())
}

/// Recomputes a photo's aggregates from the surviving rating rows across
/// all users. Must run after this call's deletions so it observes them.
async fn recompute_photo_aggregates(
    txn: &DatabaseTransaction,
    photo_id: Uuid,
    now: DateTime<Utc>,
) -> StorageResult<()> {
    let Some(photo) = photos::Entity::find_by_id(photo_id)
        .one(txn)
        .await
        .map_err(StorageError::from_source)?
    else {
        return Ok(());
    };

    let remaining: Vec<i32> = ratings::Entity::find()
        .select_only()
        .column(ratings::Column::Rating)
        .filter(ratings::Column::PhotoId.eq(photo_id))
        .into_tuple()
        .all(txn)
        .await
        .map_err(StorageError::from_source)?;

    let total_ratings = remaining.len() as i32;
    let average_rating = if remaining.is_empty() {
        Decimal::ZERO
    } else {
        let sum: Decimal = remaining.iter().map(|&value| Decimal::from(value)).sum();
        (sum / Decimal::from(total_ratings)).round_dp(2)
    };

    let mut model: photos::ActiveModel = photo.into();
    model.total_ratings = Set(total_ratings);
    model.average_rating = Set(average_rating);
    model.updated_at = Set(now);
    model.update(txn).await.map_err(StorageError::from_source)?;
    Ok(())
}
