use log::warn;
use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

/// Longest session cookie the server will issue (one year).
pub const MAX_SESSION_HOURS: i64 = 24 * 365;

// Config
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub pool_size: u32,
    pub session_max_age_hours: i64,
    pub workers: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|e| format!("DATABASE_URL must be set: {}", e))?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = match env::var("PORT") {
            Ok(v) => v.parse::<u16>().map_err(|_| format!("PORT must be a number, got {}", v))?,
            Err(_) => 8080,
        };

        let environment = env::var("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or_else(|_| {
                warn!("APP_ENV not set, assuming development");
                Environment::Development
            });

        let pool_size = env::var("DB_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let session_max_age_hours = env::var("SESSION_MAX_AGE_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(24);

        let workers = env::var("WORKERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(2);

        Ok(Self {
            database_url,
            host,
            port,
            environment,
            pool_size,
            session_max_age_hours,
            workers,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.pool_size == 0 {
            return Err("DB_POOL_SIZE must be positive".to_string());
        }

        if self.session_max_age_hours <= 0 {
            return Err("SESSION_MAX_AGE_HOURS must be positive".to_string());
        }

        if self.session_max_age_hours > MAX_SESSION_HOURS {
            return Err(format!(
                "SESSION_MAX_AGE_HOURS must be at most {}, got {}",
                MAX_SESSION_HOURS, self.session_max_age_hours
            ));
        }

        if self.workers == 0 {
            return Err("WORKERS must be positive".to_string());
        }

        if !self.is_production() && self.host == "0.0.0.0" {
            warn!("Listening on all interfaces outside production");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Connection string handed to the pool. Production requires TLS toward
    /// the store unless the URL already chooses an sslmode.
    pub fn connection_url(&self) -> String {
        if self.is_production() && !self.database_url.contains("sslmode=") {
            let separator = if self.database_url.contains('?') { '&' } else { '?' };
            format!("{}{}sslmode=require", self.database_url, separator)
        } else {
            self.database_url.clone()
        }
    }

    /// Defaults for tests and tools that build a config by hand.
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: Environment::Development,
            pool_size: 2,
            session_max_age_hours: 24,
            workers: 1,
        }
    }
}
