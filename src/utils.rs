use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rng, RngCore};

// ###################################
// ->   Base64-URL utils
// ###################################
pub fn b64u_encode(v: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(v)
}

pub fn b64u_decode(v: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(v)
        .map_err(|er| UtilsError::B64uDecode(er.to_string()))
}

// ###################################
// ->   Random tokens
// ###################################
/// Generates `N` random bytes and encodes them to Base64-URL without padding.
pub fn random_b64u_token<const N: usize>() -> String {
    let mut rand_bytes = [0u8; N];
    rng().fill_bytes(&mut rand_bytes);
    b64u_encode(rand_bytes)
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, UtilsError>;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    #[error("Base64-URL decoding error: {0}")]
    B64uDecode(String),
}
