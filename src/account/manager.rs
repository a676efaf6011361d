/// Account manager implementation using runtime queries
/// This version uses sqlx runtime query building instead of compile-time macros
/// to avoid needing DATABASE_URL during compilation

use crate::{
    account::{Claims, CreateUserRequest, LoginRequest, Role, UpdateUserRequest, User, UserWithToken},
    config::ServerConfig,
    db::is_unique_violation,
    error::{VaultError, VaultResult},
    files::Receipt,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

const USER_COLUMNS: &str = "id, name, email, password_hash, roles, is_active, created_at";

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Register a new user and issue a token
    pub async fn register(&self, req: CreateUserRequest) -> VaultResult<UserWithToken> {
        let email = normalize_email(&req.email);

        if self.get_user_by_email(&email).await?.is_some() {
            return Err(email_taken(&email));
        }

        let password_hash = hash_password(&req.password)?;
        let now = Utc::now();
        let roles = self.initial_roles(&email);

        let result = sqlx::query(
            "INSERT INTO auth_user (name, email, password_hash, roles, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(req.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(Role::join(&roles))
        .bind(true)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                email_taken(&email)
            } else {
                VaultError::PersistenceFault(e)
            }
        })?;

        let user = User {
            id: result.last_insert_rowid(),
            name: req.name.trim().to_string(),
            email,
            password_hash,
            roles,
            is_active: true,
            created_at: now,
        };

        tracing::info!("Registered user {} ({})", user.id, user.email);

        self.with_token(user)
    }

    /// Authenticate with email and password
    pub async fn login(&self, req: LoginRequest) -> VaultResult<UserWithToken> {
        let email = normalize_email(&req.email);

        let user = self
            .get_user_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(invalid_credentials());
        }

        if !user.is_active {
            return Err(inactive_user());
        }

        self.with_token(user)
    }

    /// Issue a fresh token for an already authenticated user
    pub fn renew(&self, user: User) -> VaultResult<UserWithToken> {
        self.with_token(user)
    }

    /// Fetch a user by id
    pub async fn find_one(&self, id: i64) -> VaultResult<User> {
        self.get_user(id)
            .await?
            .ok_or_else(|| VaultError::NotFound(format!("User with ID: {} not found", id)))
    }

    /// Apply a partial update and issue a new token
    pub async fn update(&self, id: i64, req: UpdateUserRequest) -> VaultResult<UserWithToken> {
        let mut user = self.find_one(id).await?;

        if let Some(name) = req.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = req.email {
            user.email = normalize_email(&email);
        }
        if let Some(password) = req.password {
            user.password_hash = hash_password(&password)?;
        }

        sqlx::query("UPDATE auth_user SET name = ?1, email = ?2, password_hash = ?3 WHERE id = ?4")
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    email_taken(&user.email)
                } else {
                    VaultError::PersistenceFault(e)
                }
            })?;

        self.with_token(user)
    }

    /// Mark a user inactive; the row is kept
    pub async fn deactivate(&self, id: i64) -> VaultResult<Receipt> {
        let result = sqlx::query("UPDATE auth_user SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(VaultError::NotFound(format!("User with ID: {} not found", id)));
        }

        tracing::info!("Deactivated user {}", id);

        Ok(Receipt::new("User have been deactivated."))
    }

    /// Resolve a bearer token to its user
    pub async fn authenticate(&self, token: &str) -> VaultResult<User> {
        let claims = self.verify_token(token)?;
        let id: i64 = claims
            .uid
            .parse()
            .map_err(|_| VaultError::Authentication("Invalid token subject".to_string()))?;

        let user = self
            .get_user(id)
            .await?
            .ok_or_else(|| VaultError::Authentication("Token not valid".to_string()))?;

        if !user.is_active {
            return Err(inactive_user());
        }

        Ok(user)
    }

    /// Get user by id
    pub async fn get_user(&self, id: i64) -> VaultResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM auth_user WHERE id = ?1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Get user by (normalized) email
    pub async fn get_user_by_email(&self, email: &str) -> VaultResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM auth_user WHERE email = ?1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Sign a token for the given user id
    pub fn generate_token(&self, uid: i64) -> VaultResult<String> {
        let now = Utc::now();
        let expires_in = Duration::seconds(self.config.authentication.jwt_expires_in as i64);
        let claims = Claims {
            uid: uid.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes()),
        )
        .map_err(|e| VaultError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry of a token
    pub fn verify_token(&self, token: &str) -> VaultResult<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.authentication.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;

        decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!("JWT verification failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        VaultError::Authentication("Token has expired".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        VaultError::Authentication("Invalid token signature".to_string())
                    }
                    _ => VaultError::Authentication(format!("Invalid token: {}", e)),
                }
            })
    }

    /// Configured admin emails are seeded with the admin roles
    fn initial_roles(&self, email: &str) -> Vec<Role> {
        let admins = &self.config.authentication.admin_emails;
        if admins.iter().any(|admin| admin == email) {
            vec![Role::User, Role::Admin, Role::SuperAdmin]
        } else {
            vec![Role::User]
        }
    }

    fn with_token(&self, user: User) -> VaultResult<UserWithToken> {
        let token = self.generate_token(user.id)?;
        Ok(UserWithToken { user, token })
    }
}

fn user_from_row(row: &SqliteRow) -> VaultResult<User> {
    let roles: String = row.get("roles");
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        roles: Role::parse_list(&roles)?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> VaultResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| VaultError::Internal(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> VaultResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| VaultError::Internal(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn email_taken(email: &str) -> VaultError {
    VaultError::DuplicateName(format!("Email: {} already exists on this database.", email))
}

fn invalid_credentials() -> VaultError {
    VaultError::Authentication("Invalid credentials".to_string())
}

fn inactive_user() -> VaultError {
    VaultError::Authorization("User is inactive, talk with an admin".to_string())
}
