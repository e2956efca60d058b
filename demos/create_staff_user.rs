//! Creates a staff account that can log into `/admin`.
//! Uses the same configuration as the server (`APP_ENVIRONMENT`, `config/`, `APP_*` variables).

use secrecy::SecretString;
use uuid::Uuid;
use waxwarm::{config::get_or_init_config, database::DbManager, web::auth::password};

fn prompt(label: &str) -> anyhow::Result<String> {
    println!("{label}:");
    let mut buf = String::with_capacity(256);
    std::io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("\nSTAFF USER SETUP UTILITY\n");
    println!("Leading and trailing whitespace is removed from every answer.\n");

    let username = prompt("username")?;
    let password = prompt("password")?;
    anyhow::ensure!(
        !username.is_empty() && !password.is_empty(),
        "username and password are required"
    );

    let password_hash = password::hash_new_to_string_async(SecretString::from(password)).await?;

    let dm = DbManager::init(get_or_init_config()).await?;
    dm.migrate().await?;

    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
    INSERT INTO users (user_id, username, password_hash, is_staff)
    VALUES ($1, $2, $3, TRUE)
    "#,
    )
    .bind(user_id)
    .bind(&username)
    .bind(password_hash)
    .execute(dm.db())
    .await?;

    println!("\nCreated staff user '{username}' ({user_id})");

    Ok(())
}
