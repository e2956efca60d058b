pub type Result<T> = core::result::Result<T, AuthError>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no staff user with username: {username}")]
    UsernameNotFound { username: String },
    #[error("username too long")]
    UsernameTooLong,
    #[error("invalid password - doesn't match the user's password from the table")]
    PasswordInvalid,
    #[error("password too long")]
    PasswordTooLong,

    #[error("error encoding the salt: {0}")]
    Salting(String),
    #[error("hashing error: {0}")]
    Hashing(String),

    #[error("password_hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("tokio join error: {0}")]
    TokioJoin(#[from] tokio::task::JoinError),
}

impl AuthError {
    /// Errors caused by what the user typed, as opposed to failures on our side.
    pub fn is_credentials_error(&self) -> bool {
        matches!(
            self,
            AuthError::UsernameNotFound { .. }
                | AuthError::UsernameTooLong
                | AuthError::PasswordInvalid
                | AuthError::PasswordTooLong
        )
    }
}
