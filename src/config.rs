use std::{net, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub db: Db,
    pub http: Http,
    pub jwt: Jwt,
}

#[derive(Deserialize)]
pub struct Db {
    pub url: String,
    /// Create missing tables on startup.
    #[serde(default)]
    pub migrate: bool,
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct Jwt {
    pub secret: String,
    #[serde(with = "humantime_serde")]
    pub expiration_time: time::Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml() {
        let config = toml::from_str::<Config>(
            r#"
            [db]
            url = "postgres://helpdesk@localhost/helpdesk"

            [http.server]
            addr = "127.0.0.1:3000"

            [http.cors]
            allowed_origins = ["http://localhost:5173"]

            [jwt]
            secret = "secret"
            expiration_time = "12h"
            "#,
        )
        .unwrap();

        assert!(!config.db.migrate);
        assert_eq!(config.http.server.addr.port(), 3000);
        assert_eq!(config.http.cors.allowed_origins.len(), 1);
        assert_eq!(
            config.jwt.expiration_time,
            std::time::Duration::from_secs(12 * 60 * 60),
        );
    }
}
