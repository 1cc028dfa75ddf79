use tera::Tera;

/// Tera-backed template engine for the loop's prompts.
pub struct TeraEngine {
    tera: Tera,
}

impl TeraEngine {
    /// Create an engine with no registered templates.
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
        }
    }

    /// Register a template from a string, replacing any previous one.
    pub fn add_template(&mut self, name: &str, content: &str) -> anyhow::Result<()> {
        self.tera
            .add_raw_template(name, content)
            .map_err(|e| anyhow::anyhow!("template '{name}' failed to parse: {e}"))
    }

    /// Render a named template with the given context.
    pub fn render(&self, template_name: &str, context: &tera::Context) -> anyhow::Result<String> {
        self.tera
            .render(template_name, context)
            .map_err(|e| anyhow::anyhow!("template '{template_name}' failed to render: {e:?}"))
    }

    /// Parse a template without keeping it.
    pub fn check_template(content: &str) -> anyhow::Result<()> {
        Self::new().add_template("__check__", content)
    }
}
