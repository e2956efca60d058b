//! `Credentials` is a deserializable struct containing a username and password (based on the
//! `users` table in DB). Use `authenticate()` to check them against the staff accounts.

use secrecy::{ExposeSecret, SecretString};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::database::DbManager;

use super::{password, AuthError, Result};

/// Hash checked when the username doesn't exist, so unknown users cost as much as wrong passwords.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$DqfdT4sWTiKO8R19hTTtyg$DWeO60WYNYRhAdju0/dzYNhrtmb0jZ6+/ceCHyNKNfk";

const MAX_FIELD_LEN: usize = 256;

/// User credentials
#[derive(Debug, serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// A staff user that passed authentication.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
}

impl Credentials {
    pub fn new(username: String, password: SecretString) -> Self {
        Credentials { username, password }
    }

    /// Try to authenticate a staff user using the `users` table in the DB.
    /// Non-staff accounts are treated as unknown.
    #[tracing::instrument(name = "authenticate", skip_all, fields(username = self.username))]
    pub async fn authenticate(self, dm: &DbManager) -> Result<AuthenticatedUser> {
        if self.username.graphemes(true).count() > MAX_FIELD_LEN {
            return Err(AuthError::UsernameTooLong);
        }
        if self.password.expose_secret().graphemes(true).count() > MAX_FIELD_LEN {
            return Err(AuthError::PasswordTooLong);
        }

        let user_id_n_pwd_hash: Option<(Uuid, String)> = sqlx::query_as(
            r#"
    SELECT user_id, password_hash FROM users
    WHERE username = $1 AND is_staff
    "#,
        )
        .bind(&self.username)
        .fetch_optional(dm.db())
        .await?;

        let (user_id, expected_pwd_hash) = user_id_n_pwd_hash
            .unwrap_or_else(|| (Uuid::nil(), DUMMY_HASH.to_string()));

        password::validate_async(self.password, expected_pwd_hash).await?;
        // Only reachable if someone knows the dummy password.
        if user_id.is_nil() {
            return Err(AuthError::UsernameNotFound {
                username: self.username,
            });
        }
        tracing::info!("Successful authentication!");

        Ok(AuthenticatedUser {
            user_id,
            username: self.username,
        })
    }
}
