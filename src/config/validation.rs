//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window shape, default weight)
//! - Reject duplicate or empty backend addresses

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use crate::config::schema::BalancerConfig;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("balancer.window_size must be at least 1")]
    WindowSize,
    #[error("balancer.window_bucket_ms must be greater than 0")]
    BucketDuration,
    #[error("balancer.default_weight must be at least 1")]
    DefaultWeight,
    #[error("backend #{index} has an empty address")]
    EmptyAddress { index: usize },
    #[error("duplicate backend address: {0}")]
    DuplicateAddress(String),
    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),
}

/// Collect every problem rather than stopping at the first.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.balancer.window_size == 0 {
        errors.push(ValidationError::WindowSize);
    }
    if config.balancer.window_bucket_ms == 0 {
        errors.push(ValidationError::BucketDuration);
    }
    if config.balancer.default_weight == 0 {
        errors.push(ValidationError::DefaultWeight);
    }

    let mut seen = HashSet::new();
    for (index, backend) in config.backends.iter().enumerate() {
        if backend.address.trim().is_empty() {
            errors.push(ValidationError::EmptyAddress { index });
        } else if !seen.insert(backend.address.as_str()) {
            errors.push(ValidationError::DuplicateAddress(backend.address.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackendConfig;

    fn backend(address: &str, weight: Option<i64>) -> BackendConfig {
        BackendConfig {
            address: address.into(),
            weight,
            color: String::new(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BalancerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = BalancerConfig::default();
        config.balancer.window_size = 0;
        config.balancer.window_bucket_ms = 0;
        config.balancer.default_weight = 0;
        config.backends = vec![backend("a:1", Some(1)), backend("a:1", Some(2)), backend(" ", None)];
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nope".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::WindowSize,
                ValidationError::BucketDuration,
                ValidationError::DefaultWeight,
                ValidationError::DuplicateAddress("a:1".into()),
                ValidationError::EmptyAddress { index: 2 },
                ValidationError::MetricsAddress("nope".into()),
            ]
        );
    }

    #[test]
    fn test_non_positive_weight_is_allowed() {
        let mut config = BalancerConfig::default();
        config.backends = vec![backend("a:1", Some(0)), backend("b:1", Some(-3))];
        assert!(validate_config(&config).is_ok());
    }
}
