use std::{net::SocketAddr, path::PathBuf, sync::OnceLock};

use anyhow::{anyhow, Result};
use reqwest::{multipart, redirect::Policy, Client, Response};
use secrecy::SecretString;
use uuid::Uuid;
use waxwarm::{
    config::{get_or_init_config, AppConfig},
    database::DbManager,
    init_dbg_tracing,
    model::Subscription,
    web::auth::password,
    App,
};

pub const STAFF_USERNAME: &str = "candlemaker";
pub const STAFF_PASSWORD: &str = "soy-wax-and-cotton-wicks";

pub struct TestApp {
    pub addr: SocketAddr,
    pub dm: DbManager,
    pub http_client: Client,
    pub static_root: PathBuf,
}

fn _init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        init_dbg_tracing();
    });
}

impl TestApp {
    /// Spawns the app on a random port against a fresh database.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Like `spawn`, but lets the test adjust the configuration first.
    pub async fn spawn_with(customize: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        // _init_test_subscriber();

        let mut config = get_or_init_config().clone();
        // Trying to bind port 0 will trigger an OS scan for an available port.
        config.net_config.app_port = 0;
        config.site_config.debug = true;
        config.site_config.static_root = static_fixture().await?;
        customize(&mut config);

        let static_root = config.site_config.static_root.clone();
        let dm = DbManager::init_for_test(&mut config.db_config).await?;
        let app = App::build(config, dm.clone()).await?;
        let addr = app.listener.local_addr()?;

        tokio::spawn(waxwarm::serve(app));

        let http_client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()?;

        Ok(TestApp {
            addr,
            dm,
            http_client,
            static_root,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.http_client.get(self.url(path)).send().await?)
    }

    pub async fn get_html(&self, path: &str) -> Result<String> {
        Ok(self.get(path).await?.text().await?)
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Response> {
        Ok(self
            .http_client
            .post(self.url(path))
            .form(form)
            .send()
            .await?)
    }

    /// Loads the home page (issuing the CSRF cookie) and returns the token bound in the page.
    pub async fn csrf_token(&self) -> Result<String> {
        let html = self.get_html("/").await?;
        extract_csrf_token(&html)
    }

    /// Posts a form with a valid CSRF token added.
    pub async fn post_form_with_csrf(&self, path: &str, form: &[(&str, &str)]) -> Result<Response> {
        let token = self.csrf_token().await?;
        let mut fields = form.to_vec();
        fields.push(("csrfmiddlewaretoken", &token));
        self.post_form(path, &fields).await
    }

    /// Posts the fields as `multipart/form-data` with a valid CSRF token, the way the
    /// site's script submits its forms.
    pub async fn post_multipart_with_csrf(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<Response> {
        let token = self.csrf_token().await?;
        let form = fields
            .iter()
            .fold(multipart::Form::new(), |form, (name, value)| {
                form.text(name.to_string(), value.to_string())
            })
            .text("csrfmiddlewaretoken", token);

        Ok(self
            .http_client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await?)
    }

    pub async fn subscribe(&self, email: &str) -> Result<Response> {
        self.post_form_with_csrf("/newsletter-signup/", &[("email", email)])
            .await
    }

    pub async fn find_subscription(&self, email: &str) -> Result<Option<Subscription>> {
        let sub = sqlx::query_as(
            "SELECT id, email, subscribed_at, is_active, ip_address, user_agent \
             FROM subscriptions WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.dm.db())
        .await?;
        Ok(sub)
    }

    pub async fn create_user(&self, username: &str, pwd: &str, is_staff: bool) -> Result<()> {
        let password_hash = password::hash_new_to_string(SecretString::from(pwd.to_string()))?;
        sqlx::query(
            "INSERT INTO users (user_id, username, password_hash, is_staff) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .bind(is_staff)
        .execute(self.dm.db())
        .await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, pwd: &str) -> Result<Response> {
        let html = self.get_html("/admin/login").await?;
        let token = extract_csrf_token(&html)?;
        self.post_form(
            "/admin/login",
            &[
                ("username", username),
                ("password", pwd),
                ("csrfmiddlewaretoken", &token),
            ],
        )
        .await
    }

    /// Creates the staff user and logs in as them.
    pub async fn login_staff(&self) -> Result<()> {
        self.create_user(STAFF_USERNAME, STAFF_PASSWORD, true)
            .await?;
        let resp = self.login(STAFF_USERNAME, STAFF_PASSWORD).await?;
        assert_resp_redir_to(&resp, "/admin/subscriptions");
        Ok(())
    }
}

pub fn extract_csrf_token(html: &str) -> Result<String> {
    let marker = r#"name="csrfmiddlewaretoken" value=""#;
    let start = html
        .find(marker)
        .ok_or_else(|| anyhow!("no CSRF token in page"))?
        + marker.len();
    let len = html[start..]
        .find('"')
        .ok_or_else(|| anyhow!("unterminated CSRF token"))?;
    Ok(html[start..start + len].to_string())
}

pub fn assert_resp_redir_to(resp: &Response, location: &str) {
    assert_eq!(
        resp.status().as_u16(),
        303,
        "expected a redirect to {location}"
    );
    assert_eq!(
        resp.headers().get("Location").and_then(|l| l.to_str().ok()),
        Some(location)
    );
}

/// A throwaway static root with a stylesheet, an extensionless image and a private file.
async fn static_fixture() -> Result<PathBuf> {
    let root = std::env::temp_dir().join(format!("waxwarm_assets_{}", Uuid::new_v4().simple()));
    tokio::fs::create_dir_all(root.join("images")).await?;
    tokio::fs::write(root.join("style.css"), "body { color: #333; }").await?;
    tokio::fs::write(root.join("images").join("hero"), [0x89u8, 0x50, 0x4e, 0x47]).await?;
    tokio::fs::write(root.join("notes.txt"), "not an asset").await?;
    Ok(root)
}
