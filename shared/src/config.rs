use anyhow::Result;

pub struct AppConfig {
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "library.db".into()),
        };
        Ok(Self { database })
    }
}

pub struct DatabaseConfig {
    pub path: String,
}
