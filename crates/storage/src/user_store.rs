use ratedesk_domain::model::UserAccount;
use ratedesk_domain::storage::{StorageError, StorageResult, UserDirectory};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::users;
use crate::SeaOrmStorage;

#[async_trait::async_trait]
impl UserDirectory for SeaOrmStorage {
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserAccount>> {
        let maybe = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(maybe.map(user_to_account))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> StorageResult<Option<UserAccount>> {
        let maybe = users::Entity::find_by_id(user_id)
            .one(self.connection())
            .await
            .map_err(StorageError::from_source)?;
        Ok(maybe.map(user_to_account))
    }
}

fn user_to_account(model: users::Model) -> UserAccount {
    UserAccount {
        id: model.id,
        email: model.email,
        current_earnings: model.current_earnings,
        lifetime_earnings: model.lifetime_earnings,
        total_paid_out: model.total_paid_out,
        is_active: model.is_active,
        total_photos_rated: model.total_photos_rated,
        photos_rated_in_current_batch: model.photos_rated_in_current_batch,
        ratings_in_current_period: model.ratings_in_current_period,
    }
}
