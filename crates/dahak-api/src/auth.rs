use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info, warn};

use dahak_db::Database;
use dahak_types::api::{Claims, LoginRequest, LoginResponse};
use dahak_types::models::User;

use crate::error::ApiError;
use crate::extract::ApiJson;

/// Issued tokens are valid for one day.
const TOKEN_TTL_HOURS: i64 = 24;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Built storefront client, served for every non-API path when set.
    pub static_dir: Option<PathBuf>,
}

/// Run a blocking database call off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = req.username.clone();
    let lookup = username.clone();
    let user = run_db(&state, move |db| db.get_user_by_username(&lookup))
        .await?
        .ok_or_else(|| {
            info!("Login attempt for unknown user '{}'", username);
            ApiError::bad_request("User not found")
        })?;

    // Verification runs on the blocking pool.
    let password_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&req.password, &password_hash))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?;

    if !valid {
        warn!("Invalid password for user '{}'", user.username);
        return Err(ApiError::bad_request("Invalid password"));
    }

    let token = create_token(&state.jwt_secret, user.id, &user.username, &user.role).map_err(|e| {
        error!("Failed to sign token: {}", e);
        ApiError::Internal
    })?;

    info!("User '{}' logged in", user.username);

    Ok(Json(LoginResponse {
        token,
        user: User {
            id: user.id,
            username: user.username,
            role: user.role,
        },
    }))
}

/// GET /api/auth/me: the identity carried by the caller's token.
pub async fn me(Extension(claims): Extension<Claims>) -> Json<User> {
    Json(User {
        id: claims.sub,
        username: claims.username,
        role: claims.role,
    })
}

pub fn create_token(secret: &str, user_id: i64, username: &str, role: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role: role.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Hash a password with Argon2id.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// Hashes that are not in PHC format (for example bcrypt hashes from an
/// older deployment) never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is not a PHC string: {}", e);
            false
        }
    }
}

/// Make sure the back-office account exists.
///
/// Creates it when missing. An account whose stored hash is not Argon2 is
/// reset to `password` so it stays reachable after a migration.
pub fn seed_admin(db: &Database, username: &str, password: &str) -> anyhow::Result<()> {
    match db.get_user_by_username(username)? {
        None => {
            let hash = hash_password(password)?;
            db.create_user(username, &hash, "admin")?;
            warn!("Admin user created: '{}'. Change its password before going live.", username);
        }
        Some(user) if !user.password_hash.starts_with("$argon2") => {
            let hash = hash_password(password)?;
            db.set_password_hash(username, &hash)?;
            warn!("Admin user '{}' had a legacy password hash; it was reset", username);
        }
        Some(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn token_round_trip() {
        let token = create_token("secret", 7, "admin", "admin").unwrap();
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, 7);
        assert_eq!(data.claims.username, "admin");

        let wrong = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::default(),
        );
        assert!(wrong.is_err());
    }

    #[test]
    fn password_hashing() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password(
            "admin123",
            "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy"
        ));
    }

    #[test]
    fn seeding_is_idempotent_and_upgrades_legacy_hashes() {
        let db = Database::open_in_memory().unwrap();
        seed_admin(&db, "admin", "admin123").unwrap();
        let first = db.get_user_by_username("admin").unwrap().unwrap();
        seed_admin(&db, "admin", "ignored").unwrap();
        let second = db.get_user_by_username("admin").unwrap().unwrap();
        assert_eq!(first.password_hash, second.password_hash);
        assert_eq!(db.count_users().unwrap(), 1);

        db.set_password_hash("admin", "$2a$10$legacy").unwrap();
        seed_admin(&db, "admin", "fresh-pass").unwrap();
        let upgraded = db.get_user_by_username("admin").unwrap().unwrap();
        assert!(verify_password("fresh-pass", &upgraded.password_hash));
    }
}
