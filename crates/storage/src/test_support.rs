//! Fixture helpers shared by the storage tests. Everything runs against an
//! in-memory SQLite database with the real migrations applied.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::Set;
use uuid::Uuid;

use crate::entity::{
    payments::{self, PaymentStatusDb},
    photos, ratings, users,
};
use crate::SeaOrmStorage;

pub(crate) async fn storage() -> SeaOrmStorage {
    SeaOrmStorage::connect("sqlite::memory:")
        .await
        .expect("storage inits")
}

pub(crate) fn money(value: &str) -> Decimal {
    value.parse().expect("valid decimal literal")
}

/// A fixed-date timestamp so ordering assertions stay deterministic.
pub(crate) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
}

pub(crate) fn user_fixture(email: &str) -> users::ActiveModel {
    users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_owned()),
        current_earnings: Set(money("0.00")),
        lifetime_earnings: Set(money("0.00")),
        total_paid_out: Set(money("0.00")),
        is_active: Set(true),
        total_photos_rated: Set(0),
        photos_rated_in_current_batch: Set(0),
        ratings_in_current_period: Set(0),
        created_at: Set(at(0, 0)),
        updated_at: Set(at(0, 0)),
    }
}

pub(crate) fn photo_fixture() -> photos::ActiveModel {
    photos::ActiveModel {
        id: Set(Uuid::new_v4()),
        image_url: Set("https://cdn.example.com/photo.jpg".to_owned()),
        batch_id: Set(Uuid::new_v4()),
        is_active: Set(true),
        total_ratings: Set(0),
        average_rating: Set(money("0.00")),
        created_at: Set(at(0, 0)),
        updated_at: Set(at(0, 0)),
        deleted_at: Set(None),
    }
}

pub(crate) fn rating_fixture(
    user_id: Uuid,
    photo_id: Uuid,
    rating: i32,
    earnings: &str,
    start_time: DateTime<Utc>,
) -> ratings::ActiveModel {
    ratings::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        photo_id: Set(photo_id),
        rating: Set(rating),
        time_in_seconds: Set(30),
        start_time: Set(start_time),
        end_time: Set(start_time + Duration::seconds(30)),
        earnings: Set(money(earnings)),
        created_at: Set(start_time),
        updated_at: Set(start_time),
    }
}

pub(crate) fn payment_fixture(
    user_id: Uuid,
    amount: &str,
    status: PaymentStatusDb,
) -> payments::ActiveModel {
    let amount = money(amount);
    payments::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        amount: Set(amount),
        paypal_email: Set("payout@example.com".to_owned()),
        paypal_transaction_id: Set(None),
        status: Set(status),
        kind: Set("cashout".to_owned()),
        transfer_fee: Set(money("0.25")),
        net_amount: Set(amount - money("0.25")),
        error_message: Set(None),
        processed_at: Set(None),
        created_at: Set(at(0, 0)),
        updated_at: Set(at(0, 0)),
    }
}
