use crate::config::types::{
    Config, CrawlerConfig, IndexingConfig, OutputConfig, SearchConfig, SiteEntry, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_indexing_config(&config.indexing)?;
    validate_search_config(&config.search)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_pages_open < 1 || config.max_concurrent_pages_open > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_pages_open must be between 1 and 100, got {}",
            config.max_concurrent_pages_open
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.agent.trim().is_empty() {
        return Err(ConfigError::Validation("agent cannot be empty".to_string()));
    }

    Url::parse(&config.referrer)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referrer: {}", e)))?;

    Ok(())
}

fn validate_indexing_config(config: &IndexingConfig) -> Result<(), ConfigError> {
    if config.valid_status_codes.is_empty() {
        return Err(ConfigError::Validation(
            "valid_status_codes cannot be empty".to_string(),
        ));
    }

    if let Some(code) = config
        .valid_status_codes
        .iter()
        .find(|code| !(100..=599).contains(*code))
    {
        return Err(ConfigError::Validation(format!(
            "valid_status_codes contains an impossible HTTP status: {}",
            code
        )));
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.frequency_threshold_percent < 1 || config.frequency_threshold_percent > 100 {
        return Err(ConfigError::Validation(format!(
            "frequency_threshold_percent must be between 1 and 100, got {}",
            config.frequency_threshold_percent
        )));
    }

    if config.default_limit < 1 {
        return Err(ConfigError::Validation(
            "default_limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site list
fn validate_sites(sites: &[SiteEntry]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] entry is required".to_string(),
        ));
    }

    for (i, site) in sites.iter().enumerate() {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' must have a name",
                site.url
            )));
        }

        if sites[..i].iter().any(|other| other.url == site.url) {
            return Err(ConfigError::Validation(format!(
                "site '{}' is listed more than once",
                site.url
            )));
        }
    }

    Ok(())
}
