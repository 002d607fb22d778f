//! Authentication service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, Permission, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by login and password, returning a JWT and its lifetime in seconds
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, i64)> {
        let user = self
            .repository
            .users
            .get_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !verify_password(&user.password, password)? {
            tracing::info!(login, "Login failed");
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let ttl = self.config.jwt_expiration_hours as i64 * 3600;
        let claims = UserClaims::new(&user, Utc::now().timestamp(), ttl);
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok((token, ttl))
    }

    pub async fn get_user(&self, user_id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    /// Create the configured staff account if it does not exist yet
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let (Some(login), Some(password)) = (&self.config.admin_login, &self.config.admin_password)
        else {
            return Ok(());
        };

        if self.repository.users.get_by_login(login).await?.is_some() {
            return Ok(());
        }

        let user = self
            .create_user(CreateUser {
                login: login.clone(),
                password: password.clone(),
                first_name: None,
                last_name: None,
                email: None,
                permissions: vec![Permission::CanMarkReturned],
            })
            .await?;

        tracing::info!(user_id = user.id, login = %user.login, "Created staff account");
        Ok(())
    }

    /// Register an account; the caller is expected to hold the staff permission
    pub async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        let hash = hash_password(&input.password)?;
        let user = self.repository.users.create(&input, &hash).await?;

        tracing::info!(
            user_id = user.id,
            login = %user.login,
            staff = user.granted_permissions().contains(&Permission::CanMarkReturned),
            "User created"
        );
        Ok(user)
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
