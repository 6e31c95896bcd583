use crate::{
    error::{AppError, AppResult},
    models::{user, MediaRef, User, UserModel},
    services::email::EmailService,
    utils::{
        hash_password,
        reset::{generate_reset_token, hash_reset_token},
        verify_password,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Reset tokens die 15 minutes after issuance.
const RESET_TOKEN_TTL_MINUTES: i64 = 15;

/// One message for wrong password and unknown email alike, so the endpoint
/// cannot be used to probe which addresses have accounts.
const LOGIN_FAILED: &str = "Email or password do not match";

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register a new user. The caller supplies the avatar (already stored,
    /// or the default); the password arrives as plaintext and leaves this
    /// function only as a bcrypt hash.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        avatar: MediaRef,
    ) -> AppResult<UserModel> {
        let email = normalize_email(email);

        if self.email_exists(&email).await? {
            return Err(AppError::Validation("Email already exists".to_string()));
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            full_name: sea_orm::ActiveValue::Set(full_name.trim().to_string()),
            email: sea_orm::ActiveValue::Set(email),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            role: sea_orm::ActiveValue::Set(user::ROLE_USER.to_string()),
            avatar_public_id: sea_orm::ActiveValue::Set(avatar.public_id),
            avatar_url: sea_orm::ActiveValue::Set(avatar.url),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let created = new_user.insert(&self.db).await?;
        Ok(created)
    }

    /// Authenticate by email + password. Unknown email and wrong password
    /// produce the identical failure.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserModel> {
        let email = normalize_email(email);

        let user = User::find()
            .filter(user::Column::Email.eq(&email))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Validation(LOGIN_FAILED.to_string()))?;

        let is_valid = verify_password(password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Validation(LOGIN_FAILED.to_string()));
        }

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Change password for an authenticated user after re-checking the old
    /// one.
    pub async fn change_password(
        &self,
        user_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get_user_by_id(user_id).await?;

        let is_valid = verify_password(old_password, &user.password_hash)?;
        if !is_valid {
            return Err(AppError::Validation("Invalid old password".to_string()));
        }

        let new_hash = hash_password(new_password)?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        Ok(())
    }

    /// Start the reset lifecycle: store the token digest + expiry on the
    /// user record and mail the plaintext. Unknown emails succeed silently
    /// (no account-enumeration oracle). If the mail cannot be delivered the
    /// stored fields are rolled back so no live token is left behind.
    pub async fn forgot_password(
        &self,
        email: &str,
        email_service: &EmailService,
    ) -> AppResult<()> {
        let email = normalize_email(email);

        let user = match User::find()
            .filter(user::Column::Email.eq(&email))
            .one(&self.db)
            .await?
        {
            Some(u) => u,
            None => return Ok(()),
        };

        let (plaintext, digest) = generate_reset_token()?;
        let now = chrono::Utc::now().naive_utc();
        let expires = now + chrono::Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        let user_id = user.id;

        let mut active: user::ActiveModel = user.into();
        active.reset_token_hash = sea_orm::ActiveValue::Set(Some(digest));
        active.reset_token_expires = sea_orm::ActiveValue::Set(Some(expires));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;

        if let Err(e) = email_service
            .send_password_reset_email(&email, &plaintext)
            .await
        {
            tracing::error!("Failed to send password reset email: {e}");
            self.clear_reset_fields(user_id).await?;
            return Err(AppError::Internal(anyhow::anyhow!(
                "Reset email could not be sent"
            )));
        }

        Ok(())
    }

    /// Redeem a reset token. The incoming plaintext is re-digested and must
    /// match a stored digest with an unexpired window; wrong and expired
    /// tokens are deliberately indistinguishable. On success the new
    /// password is hashed in and both reset fields are cleared, making the
    /// token single-use.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let digest = hash_reset_token(token);
        let now = chrono::Utc::now().naive_utc();

        let user = User::find()
            .filter(user::Column::ResetTokenHash.eq(&digest))
            .filter(user::Column::ResetTokenExpires.gt(now))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::Validation(
                    "Token is invalid or expired, please try again".to_string(),
                )
            })?;

        let new_hash = hash_password(new_password)?;

        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.reset_token_hash = sea_orm::ActiveValue::Set(None);
        active.reset_token_expires = sea_orm::ActiveValue::Set(None);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;

        Ok(())
    }

    async fn clear_reset_fields(&self, user_id: i32) -> AppResult<()> {
        let user = self.get_user_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.reset_token_hash = sea_orm::ActiveValue::Set(None);
        active.reset_token_expires = sea_orm::ActiveValue::Set(None);
        active.update(&self.db).await?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}

/// Emails are stored and compared trimmed + lower-cased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@x.com"), "bob@x.com");
    }

    #[test]
    fn login_failure_message_is_generic() {
        // the message must not mention whether the account exists
        assert!(!LOGIN_FAILED.to_lowercase().contains("exist"));
        assert!(!LOGIN_FAILED.to_lowercase().contains("registered"));
    }

    #[test]
    fn reset_ttl_is_fifteen_minutes() {
        assert_eq!(RESET_TOKEN_TTL_MINUTES, 15);
    }
}
