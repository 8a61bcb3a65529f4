use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub db_max_connections: u32,
    /// Flat fee added to every new order, in minor currency units.
    pub delivery_fee: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(10);
        let delivery_fee = match env::var("DELIVERY_FEE") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|fee| *fee >= 0)
                .ok_or_else(|| anyhow::anyhow!("DELIVERY_FEE must be a non-negative integer"))?,
            Err(_) => 0,
        };
        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            db_max_connections,
            delivery_fee,
        })
    }
}
