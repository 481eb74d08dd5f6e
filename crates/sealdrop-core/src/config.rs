//! Configuration module
//!
//! Environment-driven configuration shared by the API server and the
//! reconciliation worker. Required secrets fail fast; everything else has a
//! sensible default.

use std::env;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;
const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 60;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Base URL of the object-store bucket, e.g.
    /// `https://my-bucket.s3.eu-west-1.amazonaws.com`.
    pub s3_bucket_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,
    pub turnstile_secret: String,
    pub max_file_size_bytes: i64,
    /// Lifetime of scoped credentials. Short by design: a leaked or logged
    /// presigned URL stops working within this window.
    pub presign_expiry_secs: u64,
    pub reconcile_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let s3_bucket_url = env::var("S3_BUCKET_URL")
            .map_err(|_| anyhow::anyhow!("S3_BUCKET_URL must be set"))?
            .trim_end_matches('/')
            .to_string();

        let aws_region = env::var("AWS_REGION")
            .ok()
            .or_else(|| guess_region(&s3_bucket_url))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| DEFAULT_DB_MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            s3_bucket_url,
            aws_access_key_id: env::var("AWS_ACCESS_KEY_ID")
                .map_err(|_| anyhow::anyhow!("AWS_ACCESS_KEY_ID must be set"))?,
            aws_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY")
                .map_err(|_| anyhow::anyhow!("AWS_SECRET_ACCESS_KEY must be set"))?,
            aws_region,
            turnstile_secret: env::var("TURNSTILE_SECRET")
                .map_err(|_| anyhow::anyhow!("TURNSTILE_SECRET must be set"))?,
            max_file_size_bytes: env::var("MAX_FILE_SIZE_MB")
                .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE_MB.to_string())
                .parse::<i64>()
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB as i64)
                * 1024
                * 1024,
            presign_expiry_secs: env::var("PRESIGN_EXPIRY_SECS")
                .unwrap_or_else(|_| DEFAULT_PRESIGN_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS),
            reconcile_interval_secs: env::var("RECONCILE_INTERVAL_SECS")
                .unwrap_or_else(|_| DEFAULT_RECONCILE_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_RECONCILE_INTERVAL_SECS),
        })
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

/// Best-effort region extraction from a bucket URL: the host segment after
/// `s3`, for both virtual-hosted (`bucket.s3.<region>.amazonaws.com`) and
/// path-style (`s3.<region>.amazonaws.com/bucket`) forms.
fn guess_region(bucket_url: &str) -> Option<String> {
    let host = bucket_url
        .split("://")
        .nth(1)
        .unwrap_or(bucket_url)
        .split('/')
        .next()?;

    let segments: Vec<&str> = host.split('.').collect();
    let s3_pos = segments.iter().position(|s| *s == "s3")?;
    match segments.get(s3_pos + 1) {
        Some(&"amazonaws") | None => None,
        Some(region) => Some(region.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_region_virtual_hosted() {
        assert_eq!(
            guess_region("https://my-bucket.s3.eu-west-1.amazonaws.com"),
            Some("eu-west-1".to_string())
        );
    }

    #[test]
    fn test_guess_region_path_style() {
        assert_eq!(
            guess_region("https://s3.us-west-2.amazonaws.com/my-bucket"),
            Some("us-west-2".to_string())
        );
    }

    #[test]
    fn test_guess_region_legacy_global_endpoint() {
        // bucket.s3.amazonaws.com carries no region.
        assert_eq!(guess_region("https://my-bucket.s3.amazonaws.com"), None);
    }

    #[test]
    fn test_guess_region_non_s3_host() {
        assert_eq!(guess_region("https://storage.example.com/bucket"), None);
    }
}
