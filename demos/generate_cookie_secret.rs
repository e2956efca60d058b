//! Prints a fresh value for `net_config.cookie_secret_b64enc`.

use waxwarm::utils::random_b64u_token;

fn main() {
    println!("{}", random_b64u_token::<64>());
}
