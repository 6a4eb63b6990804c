//! Core business logic for the authentication system.
//!
//! Covers account registration and login, and the verification-code state
//! machine shared by the password-reset and password-change flows. All
//! collaborators are injected; nothing here reads ambient state.

use crate::auth::models::*;
use crate::database::models::{NewUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::user_repository::UserRepository;
use crate::services::email_service::{Mailer, build_reset_code_html, build_reset_code_text};
use crate::services::storage_service::ObjectStorage;
use crate::utils::multipart::UploadedFile;
use crate::utils::verification_code::generate_verification_code;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

/// Verification codes are valid for 15 minutes.
const CODE_TTL_MINUTES: i64 = 15;

/// Authentication service for registration, login, and credential lifecycle.
pub struct AuthService<'a> {
    pool: &'a SqlitePool,
    mailer: Arc<dyn Mailer>,
    storage: Arc<dyn ObjectStorage>,
}

impl<'a> AuthService<'a> {
    pub fn new(pool: &'a SqlitePool, mailer: Arc<dyn Mailer>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            pool,
            mailer,
            storage,
        }
    }

    /// Registers a new account.
    ///
    /// The password is bcrypt-hashed before it touches the database. A
    /// supplied profile image is uploaded to external storage; a failed
    /// upload leaves the account without an image rather than failing
    /// registration.
    pub async fn register(
        &self,
        request: RegisterRequest,
        image: Option<UploadedFile>,
    ) -> ServiceResult<User> {
        if let Err(errors) = request.validate() {
            return Err(crate::api::common::validation_error(errors));
        }

        let repo = UserRepository::new(self.pool);
        if repo.email_exists(&request.email).await? {
            return Err(ServiceError::duplicate_email(&request.email));
        }

        let password_hash = Self::hash_password(&request.password)?;

        let profile_pic = match image {
            Some(file) => self.storage.upload(file.bytes, &file.filename).await,
            None => None,
        };

        let user = repo
            .create_user(NewUser {
                email: request.email,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
                phone: request.phone,
                gender: request.gender,
                profile_pic,
            })
            .await?;

        Ok(user)
    }

    /// Authenticates an account by email and password.
    ///
    /// An unknown email and a wrong password both surface as
    /// `InvalidCredentials`; callers never learn which case occurred.
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<User> {
        if let Err(errors) = request.validate() {
            return Err(crate::api::common::validation_error(errors));
        }

        let repo = UserRepository::new(self.pool);
        let user = repo
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| {
                debug!("Login attempt for unknown email");
                ServiceError::InvalidCredentials
            })?;

        if !Self::verify_password(&request.password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Issues a fresh verification code and emails it to the account.
    ///
    /// Any outstanding code is silently superseded; only the newest code is
    /// ever valid. A failed email send fails the whole operation.
    pub async fn issue_code(&self, email: &str) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        let user = self.get_user_required(&repo, email).await?;

        let code = generate_verification_code();
        let expiry = Utc::now() + Duration::minutes(CODE_TTL_MINUTES);

        repo.set_verification_code(user.id, &code, expiry).await?;

        self.mailer
            .send(
                &user.email,
                "ConnectBase: Reset Your Password",
                &build_reset_code_html(&user.first_name, &code),
                &build_reset_code_text(&user.first_name, &code),
            )
            .await?;

        Ok(())
    }

    /// Resets the password with a valid code; this is the unauthenticated
    /// "forgot password" path. Knowledge of the old password is not required.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        let user = self.get_user_required(&repo, email).await?;

        Self::check_code(&user, code)?;

        let password_hash = Self::hash_password(new_password)?;
        self.consume_code(&repo, &user, code, &password_hash).await
    }

    /// Changes the password for an authenticated account.
    ///
    /// Requires both the old password and a valid code. The old-password
    /// check runs first; the error a caller observes when both are wrong is
    /// `InvalidCredentials`.
    pub async fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
        code: &str,
    ) -> ServiceResult<()> {
        let repo = UserRepository::new(self.pool);
        let user = self.get_user_required(&repo, email).await?;

        if !Self::verify_password(old_password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        Self::check_code(&user, code)?;

        let password_hash = Self::hash_password(new_password)?;
        self.consume_code(&repo, &user, code, &password_hash).await
    }

    /// Loads the account for an authenticated identity.
    pub async fn get_user_by_email(&self, email: &str) -> ServiceResult<User> {
        let repo = UserRepository::new(self.pool);
        self.get_user_required(&repo, email).await
    }

    async fn get_user_required(
        &self,
        repo: &UserRepository<'_>,
        email: &str,
    ) -> ServiceResult<User> {
        repo.get_user_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", email))
    }

    /// Validates the supplied code against the stored pair.
    ///
    /// Exact string equality; a code at or past its expiry is dead.
    fn check_code(user: &User, supplied: &str) -> ServiceResult<()> {
        let (stored, expiry) = match (&user.verification_code, user.verification_code_expiry) {
            (Some(code), Some(expiry)) => (code, expiry),
            _ => return Err(ServiceError::InvalidOrExpiredCode),
        };

        if stored != supplied || Utc::now() >= expiry {
            return Err(ServiceError::InvalidOrExpiredCode);
        }

        Ok(())
    }

    /// Clears the code and stores the new hash in one conditional UPDATE.
    ///
    /// If a concurrent request superseded or consumed the code between the
    /// read and this write, zero rows match and the code is rejected.
    async fn consume_code(
        &self,
        repo: &UserRepository<'_>,
        user: &User,
        code: &str,
        password_hash: &str,
    ) -> ServiceResult<()> {
        let updated = repo
            .consume_code_and_set_password(user.id, code, password_hash)
            .await?;

        if !updated {
            return Err(ServiceError::InvalidOrExpiredCode);
        }

        Ok(())
    }

    /// Hashes a password before it is stored.
    pub fn hash_password(password: &str) -> ServiceResult<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ServiceError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verifies a password against a stored hash.
    pub fn verify_password(password: &str, hashed: &str) -> ServiceResult<bool> {
        verify(password, hashed)
            .map_err(|e| ServiceError::internal(format!("Password verification failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_roundtrip() {
        let hashed = AuthService::hash_password("secret").unwrap();
        assert_ne!(hashed, "secret");
        assert!(AuthService::verify_password("secret", &hashed).unwrap());
        assert!(!AuthService::verify_password("wrong", &hashed).unwrap());
    }

    fn user_with_code(code: Option<&str>, expiry: Option<chrono::DateTime<Utc>>) -> User {
        User {
            id: 1,
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "L".to_string(),
            phone: "123".to_string(),
            gender: "female".to_string(),
            profile_pic: None,
            verification_code: code.map(str::to_string),
            verification_code_expiry: expiry,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_check_code_accepts_matching_unexpired() {
        let user = user_with_code(Some("123456"), Some(Utc::now() + Duration::minutes(5)));
        assert!(AuthService::check_code(&user, "123456").is_ok());
    }

    #[test]
    fn test_check_code_rejects_mismatch_and_expiry() {
        let future = Utc::now() + Duration::minutes(5);
        let user = user_with_code(Some("123456"), Some(future));
        assert!(matches!(
            AuthService::check_code(&user, "654321"),
            Err(ServiceError::InvalidOrExpiredCode)
        ));

        let expired = user_with_code(Some("123456"), Some(Utc::now() - Duration::seconds(1)));
        assert!(matches!(
            AuthService::check_code(&expired, "123456"),
            Err(ServiceError::InvalidOrExpiredCode)
        ));

        let none = user_with_code(None, None);
        assert!(matches!(
            AuthService::check_code(&none, "123456"),
            Err(ServiceError::InvalidOrExpiredCode)
        ));
    }
}
