use crate::{
    error::{AppError, AppResult},
    models::{user, MediaRef, User, UserModel},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Update the profile: new display name and/or a freshly stored avatar.
    /// Returns the previous avatar id when it was replaced so the caller
    /// can clean the old asset up.
    pub async fn update_profile(
        &self,
        user_id: i32,
        full_name: Option<&str>,
        avatar: Option<MediaRef>,
    ) -> AppResult<(UserModel, Option<String>)> {
        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let replaced_avatar = avatar.as_ref().map(|_| existing.avatar_public_id.clone());
        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = existing.into();
        if let Some(name) = full_name {
            active.full_name = sea_orm::ActiveValue::Set(name.trim().to_string());
        }
        if let Some(avatar) = avatar {
            active.avatar_public_id = sea_orm::ActiveValue::Set(avatar.public_id);
            active.avatar_url = sea_orm::ActiveValue::Set(avatar.url);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok((updated, replaced_avatar))
    }
}
