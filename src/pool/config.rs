use serde::Deserialize;

/// `[database]` section of the settings.
///
/// Either `url` is set, or the connection string is assembled from the
/// individual parts.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_pool_timeout_seconds")]
    pub pool_timeout_seconds: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_password() -> String {
    "postgres".to_string()
}

fn default_name() -> String {
    "catalog".to_string()
}

fn default_max_connections() -> usize {
    10
}

fn default_pool_timeout_seconds() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: default_password(),
            name: default_name(),
            max_connections: default_max_connections(),
            pool_timeout_seconds: default_pool_timeout_seconds(),
        }
    }
}

impl DatabaseConfig {
    /// The connection string handed to `may_postgres::connect`.
    pub fn connection_string(&self) -> String {
        match &self.url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!(
                "host={} port={} user={} password={} dbname={} sslmode=disable",
                self.host, self.port, self.user, self.password, self.name
            ),
        }
    }
}
