//! Authentication service with bcrypt password hashing and JWT tokens

use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::store::{NewUser, RecordStore};
use shared::models::DEFAULT_ROLE;
use shared::{validate_password, validate_username};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn RecordStore>,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering an account
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub fullname: Option<String>,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Issued access token
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub username: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            store,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Register a new account and issue its first token
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthTokens> {
        validate_username(&input.username).map_err(|msg| AppError::Validation {
            field: "username".to_string(),
            message: msg.to_string(),
            message_vi: "Tên đăng nhập không hợp lệ.".to_string(),
        })?;
        validate_password(&input.password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
            message_vi: "Mật khẩu phải có ít nhất 6 ký tự.".to_string(),
        })?;

        let username = input.username.trim().to_string();
        if self.store.find_user(&username).await?.is_some() {
            return Err(AppError::DuplicateEntry("username".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        self.store
            .create_user(&NewUser {
                username: username.clone(),
                password_hash,
                fullname: input.fullname,
                role: DEFAULT_ROLE.to_string(),
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(username = %username, "registered account");
        self.generate_token(&username, DEFAULT_ROLE)
    }

    /// Authenticate with username and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let user = self
            .store
            .find_user(input.username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let matches = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        self.generate_token(&user.username, &user.role)
    }

    /// Validate an access token and return its claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }

    /// Generate a signed access token
    fn generate_token(&self, username: &str, role: &str) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: username.to_string(),
            role: role.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AuthTokens {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            username: username.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with_secret(secret: &str) -> AuthService {
        AuthService {
            store: Arc::new(NullStore),
            jwt_secret: secret.to_string(),
            access_token_expiry: 3600,
        }
    }

    struct NullStore;

    #[async_trait::async_trait]
    impl RecordStore for NullStore {
        async fn create_season(
            &self,
            _season: &crate::store::NewSeason,
        ) -> AppResult<String> {
            unimplemented!()
        }
        async fn get_season(&self, _id: &str) -> AppResult<shared::models::Season> {
            unimplemented!()
        }
        async fn list_seasons(
            &self,
            _limit: Option<usize>,
        ) -> AppResult<Vec<shared::models::Season>> {
            unimplemented!()
        }
        async fn update_season(
            &self,
            _id: &str,
            _patch: &crate::store::SeasonPatch,
        ) -> AppResult<()> {
            unimplemented!()
        }
        async fn delete_season(&self, _id: &str) -> AppResult<()> {
            unimplemented!()
        }
        async fn create_user(&self, _user: &NewUser) -> AppResult<String> {
            unimplemented!()
        }
        async fn find_user(&self, _username: &str) -> AppResult<Option<shared::models::User>> {
            Ok(None)
        }
        async fn ping(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[test]
    fn issued_token_validates_and_carries_claims() {
        let service = service_with_secret("test-secret");
        let tokens = service.generate_token("farmer01", "user").unwrap();
        assert_eq!(tokens.token_type, "Bearer");

        let claims = service.validate_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, "farmer01");
        assert_eq!(claims.role, "user");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = service_with_secret("secret-a");
        let verifier = service_with_secret("secret-b");
        let tokens = issuer.generate_token("farmer01", "user").unwrap();
        assert!(matches!(
            verifier.validate_token(&tokens.access_token),
            Err(AppError::InvalidToken)
        ));
    }
}
