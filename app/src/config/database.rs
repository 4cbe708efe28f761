use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual fields.
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        if let Some(host) = &self.host {
            return format!(
                "postgres://{}:{}@{}:{}/{}",
                self.username.as_deref().unwrap_or("postgres"),
                self.password.as_deref().unwrap_or(""),
                host,
                self.port.unwrap_or(5432),
                self.database.as_deref().unwrap_or("intuneget"),
            );
        }

        "sqlite://intuneget.db?mode=rwc".to_string()
    }

    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or("public")
    }

    pub fn is_postgres(&self) -> bool {
        self.url().starts_with("postgres")
    }
}
