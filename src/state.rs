use crate::config::{AppConfig, DbConfig, Environment, TableName};
use crate::db::Store;
use crate::users::password::PasswordScheme;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Store::from_config(&config.db);
        Ok(Self { store, config })
    }

    pub fn from_parts(store: Store, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// State whose store points at a closed local port: validation paths work,
    /// anything that reaches the database fails with a connection error.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            environment: Environment::Testing,
            db: DbConfig {
                host: "127.0.0.1".into(),
                user: "test".into(),
                password: "test".into(),
                database: "test".into(),
                port: 1,
                table: TableName::new("users").expect("static table name is valid"),
            },
            password_scheme: PasswordScheme::Sha256,
            app_host: "127.0.0.1".into(),
            app_port: 0,
        });
        let store = Store::from_config(&config.db);
        Self { store, config }
    }
}
