use sea_orm::sea_query::{ColumnDef, Expr, Table, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection};

use crate::entity::{payments, photos, ratings, users};
use ratedesk_domain::storage::{StorageError, StorageResult};

pub async fn run_migrations(db: &DatabaseConnection) -> StorageResult<()> {
    let backend = db.get_database_backend();

    let users_table = Table::create()
        .if_not_exists()
        .table(users::Entity)
        .col(
            ColumnDef::new(users::Column::Id)
                .uuid()
                .not_null()
                .primary_key(),
        )
        .col(
            ColumnDef::new(users::Column::Email)
                .string()
                .not_null()
                .unique_key(),
        )
        .col(
            ColumnDef::new(users::Column::CurrentEarnings)
                .decimal_len(10, 2)
                .not_null()
                .default("0.00"),
        )
        .col(
            ColumnDef::new(users::Column::LifetimeEarnings)
                .decimal_len(10, 2)
                .not_null()
                .default("0.00"),
        )
        .col(
            ColumnDef::new(users::Column::TotalPaidOut)
                .decimal_len(10, 2)
                .not_null()
                .default("0.00"),
        )
        .col(
            ColumnDef::new(users::Column::IsActive)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(
            ColumnDef::new(users::Column::TotalPhotosRated)
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(users::Column::PhotosRatedInCurrentBatch)
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(users::Column::RatingsInCurrentPeriod)
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(users::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(users::Column::UpdatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .to_owned();
    create_table(db, backend, users_table).await?;

    let photos_table = Table::create()
        .if_not_exists()
        .table(photos::Entity)
        .col(
            ColumnDef::new(photos::Column::Id)
                .uuid()
                .not_null()
                .primary_key(),
        )
        .col(
            ColumnDef::new(photos::Column::ImageUrl)
                .string()
                .not_null(),
        )
        .col(ColumnDef::new(photos::Column::BatchId).uuid().not_null())
        .col(
            ColumnDef::new(photos::Column::IsActive)
                .boolean()
                .not_null()
                .default(true),
        )
        .col(
            ColumnDef::new(photos::Column::TotalRatings)
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(photos::Column::AverageRating)
                .decimal_len(3, 2)
                .not_null()
                .default("0.00"),
        )
        .col(
            ColumnDef::new(photos::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(photos::Column::UpdatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(ColumnDef::new(photos::Column::DeletedAt).date_time().null())
        .to_owned();
    create_table(db, backend, photos_table).await?;

    let ratings_table = Table::create()
        .if_not_exists()
        .table(ratings::Entity)
        .col(
            ColumnDef::new(ratings::Column::Id)
                .uuid()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(ratings::Column::UserId).uuid().not_null())
        .col(ColumnDef::new(ratings::Column::PhotoId).uuid().not_null())
        .col(ColumnDef::new(ratings::Column::Rating).integer().not_null())
        .col(
            ColumnDef::new(ratings::Column::TimeInSeconds)
                .integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(ratings::Column::StartTime)
                .date_time()
                .not_null(),
        )
        .col(
            ColumnDef::new(ratings::Column::EndTime)
                .date_time()
                .not_null(),
        )
        .col(
            ColumnDef::new(ratings::Column::Earnings)
                .decimal_len(10, 2)
                .not_null()
                .default("0.20"),
        )
        .col(
            ColumnDef::new(ratings::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(ratings::Column::UpdatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .to_owned();
    create_table(db, backend, ratings_table).await?;

    let payments_table = Table::create()
        .if_not_exists()
        .table(payments::Entity)
        .col(
            ColumnDef::new(payments::Column::Id)
                .uuid()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(payments::Column::UserId).uuid().not_null())
        .col(
            ColumnDef::new(payments::Column::Amount)
                .decimal_len(10, 2)
                .not_null(),
        )
        .col(
            ColumnDef::new(payments::Column::PaypalEmail)
                .string()
                .not_null(),
        )
        .col(
            ColumnDef::new(payments::Column::PaypalTransactionId)
                .string()
                .null(),
        )
        .col(
            ColumnDef::new(payments::Column::Status)
                .string_len(16)
                .not_null()
                .default("pending"),
        )
        .col(
            ColumnDef::new(payments::Column::Kind)
                .string()
                .not_null()
                .default("cashout"),
        )
        .col(
            ColumnDef::new(payments::Column::TransferFee)
                .decimal_len(10, 2)
                .not_null()
                .default("0.25"),
        )
        .col(
            ColumnDef::new(payments::Column::NetAmount)
                .decimal_len(10, 2)
                .not_null(),
        )
        .col(
            ColumnDef::new(payments::Column::ErrorMessage)
                .text()
                .null(),
        )
        .col(
            ColumnDef::new(payments::Column::ProcessedAt)
                .date_time()
                .null(),
        )
        .col(
            ColumnDef::new(payments::Column::CreatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(payments::Column::UpdatedAt)
                .date_time()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .to_owned();
    create_table(db, backend, payments_table).await?;

    Ok(())
}

async fn create_table(
    db: &DatabaseConnection,
    backend: DatabaseBackend,
    mut statement: TableCreateStatement,
) -> StorageResult<()> {
    statement.if_not_exists();
    db.execute(backend.build(&statement))
        .await
        .map_err(StorageError::from_source)?;
    Ok(())
}
