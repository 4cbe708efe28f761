use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    allow_list: Vec<String>,
    #[serde(default)]
    userless: bool,
    identity_url: Option<String>,
}

impl AuthConfig {
    pub fn allow_list(&self) -> &Vec<String> {
        return &self.allow_list;
    }

    pub fn userless(&self) -> bool {
        return self.userless;
    }

    pub fn identity_url(&self) -> Option<&str> {
        self.identity_url.as_deref()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            allow_list: vec![],
            userless: false,
            identity_url: None,
        }
    }
}
