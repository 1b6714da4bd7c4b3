use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub jwt_secret: String,
    pub jwt_cookie_name: String,

    pub coins_path: String,
    pub coingecko_base_url: String,
    pub finnhub_api_key: String,
    pub finnhub_base_url: String,

    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
    pub subscriber_queue: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            jwt_secret: "change-me-dev-secret".to_string(),
            jwt_cookie_name: "marketsentry".to_string(),
            coins_path: "data/coins.json".to_string(),
            coingecko_base_url: "https://api.coingecko.com/api/v3".to_string(),
            finnhub_api_key: String::new(),
            finnhub_base_url: "https://finnhub.io/api/v1".to_string(),
            refresh_interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(5),
            subscriber_queue: 10,
        }
    }
}

fn var_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let d = Settings::default();

    Settings {
        host: var_or("HOST", d.host),
        port: parsed_or("PORT", d.port),
        jwt_secret: var_or("JWT_SECRET", d.jwt_secret),
        jwt_cookie_name: var_or("JWT_COOKIE_NAME", d.jwt_cookie_name),
        coins_path: var_or("COINS_PATH", d.coins_path),
        coingecko_base_url: var_or("COINGECKO_BASE_URL", d.coingecko_base_url),
        finnhub_api_key: var_or("FINNHUB_API_KEY", d.finnhub_api_key),
        finnhub_base_url: var_or("FINNHUB_BASE_URL", d.finnhub_base_url),
        refresh_interval: Duration::from_secs(parsed_or("PRICE_REFRESH_SECS", d.refresh_interval.as_secs()).max(1)),
        fetch_timeout: Duration::from_secs(parsed_or("FETCH_TIMEOUT_SECS", d.fetch_timeout.as_secs()).max(1)),
        subscriber_queue: parsed_or("SUBSCRIBER_QUEUE", d.subscriber_queue).max(1),
    }
}
