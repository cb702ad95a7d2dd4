use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub commerce_endpoint: String,
    pub commerce_username: String,
    pub commerce_key: String,
    pub smtp_host: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_from: String,
    pub operator_email: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            commerce_endpoint: try_load(
                "COMMERCE_ENDPOINT",
                "https://shop.hardal-restaurant.de/index.php?route=api",
            ),
            commerce_username: try_load("COMMERCE_USERNAME", "storefront"),
            commerce_key: read_secret("COMMERCE_API_KEY"),
            smtp_host: try_load("SMTP_HOST", "smtp.gmail.com"),
            smtp_user: try_load("SMTP_USER", "bestellung@hardal-restaurant.de"),
            smtp_pass: read_secret("SMTP_PASS"),
            smtp_from: try_load("SMTP_FROM", "bestellung@hardal-restaurant.de"),
            operator_email: try_load("OPERATOR_EMAIL", "info@hardal-restaurant.de"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn read_secret(secret_name: &str) -> String {
    if let Ok(value) = env::var(secret_name) {
        return value.trim().to_string();
    }

    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .expect("Secrets misconfigured!")
}
