//! Staff authentication for the admin area.

mod credentials;
mod error;
pub mod password;

pub use credentials::{AuthenticatedUser, Credentials};
pub use error::{AuthError, Result};
