use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub redis_url: String,
    pub instance_id: String,
    pub default_processor_url: String,
    pub fallback_processor_url: String,
    pub workers: usize,
    pub max_attempts: u32,
    pub processor_timeout: Duration,
    pub health_timeout: Duration,
    pub health_check_interval: Duration,
    pub processor_pool_size: usize,
    pub store_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379/".to_string()),
            instance_id: lookup("INSTANCE_ID").unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            default_processor_url: required("DEFAULT_PROCESSOR_URL")?,
            fallback_processor_url: required("FALLBACK_PROCESSOR_URL")?,
            workers: parse_or(&lookup, "PAYMENT_WORKERS", 10)?,
            max_attempts: parse_or(&lookup, "PAYMENT_MAX_ATTEMPTS", 5)?,
            processor_timeout: Duration::from_millis(parse_or(&lookup, "PROCESSOR_TIMEOUT_MS", 200)?),
            health_timeout: Duration::from_millis(parse_or(&lookup, "HEALTH_TIMEOUT_MS", 2000)?),
            health_check_interval: Duration::from_millis(parse_or(&lookup, "HEALTH_CHECK_INTERVAL_MS", 5000)?),
            processor_pool_size: parse_or(&lookup, "PROCESSOR_POOL_SIZE", 16)?,
            store_timeout: Duration::from_millis(parse_or(&lookup, "STORE_TIMEOUT_MS", 500)?),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_processors_are_set() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DEFAULT_PROCESSOR_URL", "http://default:8080"),
            ("FALLBACK_PROCESSOR_URL", "http://fallback:8080"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.workers, 10);
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.processor_timeout, Duration::from_millis(200));
        assert_eq!(cfg.health_check_interval, Duration::from_secs(5));
        assert!(!cfg.instance_id.is_empty());
    }

    #[test]
    fn processor_urls_are_required() {
        let err = AppConfig::from_lookup(lookup(&[("DEFAULT_PROCESSOR_URL", "http://default:8080")]))
            .unwrap_err();
        assert!(err.to_string().contains("FALLBACK_PROCESSOR_URL"));

        assert!(AppConfig::from_lookup(lookup(&[
            ("DEFAULT_PROCESSOR_URL", " "),
            ("FALLBACK_PROCESSOR_URL", "http://fallback:8080"),
        ]))
        .is_err());
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DEFAULT_PROCESSOR_URL", "http://default:8080"),
            ("FALLBACK_PROCESSOR_URL", "http://fallback:8080"),
            ("PAYMENT_WORKERS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PAYMENT_WORKERS"));
    }
}
