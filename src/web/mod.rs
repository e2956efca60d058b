pub mod auth;
pub mod client;
pub mod csrf;
mod error;
pub mod flash;
mod log;
pub mod midware;
pub mod routes;
mod serve;
pub mod static_files;

pub use error::{ClientError, Error, WebResult};
pub use serve::serve;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const FLASH_COOKIE: &str = "_flash";
pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";
pub const CSRF_HEADER: &str = "x-csrftoken";
