pub mod tracing;

use std::time::Duration;

use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// MySQL connection settings. `MYSQL_HOST`, `MYSQL_USER`, `MYSQL_PASSWORD`
/// and `MYSQL_DB` land here.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DbCfg {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,
    pub pool_max_size: usize,
    pub pool_wait_timeout_secs: u64,
}

impl Default for DbCfg {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 3306,
            user: "blog_user".into(),
            password: String::new(),
            db: "blog_api".into(),
            pool_max_size: 10,
            pool_wait_timeout_secs: 5,
        }
    }
}

impl DbCfg {
    pub fn database_url(&self) -> String {
        let credentials = if self.password.is_empty() {
            self.user.clone()
        } else {
            format!("{}:{}", self.user, self.password)
        };
        format!(
            "mysql://{}@{}:{}/{}",
            credentials, self.host, self.port, self.db
        )
    }

    pub fn pool_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_wait_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Mysql,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    pub listen_addr: String,
    pub request_timeout_secs: u64,
    pub store: StoreKind,
    pub db: DbCfg,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".into(),
            request_timeout_secs: 30,
            store: StoreKind::Mysql,
            db: DbCfg::default(),
        }
    }
}

impl Settings {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Json::file("appsettings.json"))
            .merge(Env::prefixed("MYSQL_").map(|key| format!("db.{}", key).into()))
            .merge(Env::prefixed("APP_").split("__"))
    }

    pub fn load() -> figment::Result<Self> {
        Self::figment().extract()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
