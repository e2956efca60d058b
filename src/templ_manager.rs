use std::sync::OnceLock;

use tera::Tera;
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct TemplateManager {
    tera: &'static Tera,
}

impl TemplateManager {
    /// Parses everything under `templates/` once per process.
    /// Panics if a template fails to parse.
    pub fn init() -> Self {
        info!(
            "{:<20} - Initializing the Template manager",
            "templ manager"
        );
        static TERA: OnceLock<Tera> = OnceLock::new();
        let tera = TERA.get_or_init(|| {
            Tera::new("templates/**/*").unwrap_or_else(|e| panic!("Parsing error(s): {e}"))
        });
        Self { tera }
    }

    /// Renders a template file from the 'html/' directory.
    pub fn render_html_to_string(
        &self,
        ctx: &tera::Context,
        template_file: &str,
    ) -> Result<String, tera::Error> {
        let template = format!("html/{template_file}");
        self.tera.render(&template, ctx)
    }
}
