use crate::config::types::{
    Config, CrawlConfig, FetchConfig, LanguageConfig, OutputConfig, ProcessingConfig, SiteConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_processing_config(&config.processing)?;
    validate_language_config(&config.language)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url has no host: '{}'",
            config.base_url
        )));
    }

    if config.source_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source_name cannot be empty".to_string(),
        ));
    }

    if !config.category_path.contains("{slug}") {
        return Err(ConfigError::Validation(format!(
            "category_path must contain '{{slug}}', got '{}'",
            config.category_path
        )));
    }

    if config.scrape_archive
        && !(config.archive_path.contains("{year}") && config.archive_path.contains("{month}"))
    {
        return Err(ConfigError::Validation(format!(
            "archive_path must contain '{{year}}' and '{{month}}', got '{}'",
            config.archive_path
        )));
    }

    if config.categories.is_empty() && !config.scrape_archive {
        return Err(ConfigError::Validation(
            "at least one category is required unless scrape_archive is enabled".to_string(),
        ));
    }

    for category in &config.categories {
        if category.name.trim().is_empty() || category.slug.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category entries need a name and a slug, got name='{}' slug='{}'",
                category.name, category.slug
            )));
        }
    }

    scraper::Selector::parse(&config.link_selector).map_err(|e| {
        ConfigError::Validation(format!(
            "link_selector '{}' is not a valid CSS selector: {:?}",
            config.link_selector, e
        ))
    })?;

    Ok(())
}

/// Validates discovery limits
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.start_year > config.end_year {
        return Err(ConfigError::Validation(format!(
            "start_year ({}) must not be after end_year ({})",
            config.start_year, config.end_year
        )));
    }

    if config.start_year < 1900 {
        return Err(ConfigError::Validation(format!(
            "start_year must be >= 1900, got {}",
            config.start_year
        )));
    }

    if config.max_pages_per_category < 1 {
        return Err(ConfigError::Validation(
            "max_pages_per_category must be >= 1".to_string(),
        ));
    }

    if config.max_crawl_depth < 1 {
        return Err(ConfigError::Validation(
            "max_crawl_depth must be >= 1".to_string(),
        ));
    }

    if config.batch_link_size < 1 {
        return Err(ConfigError::Validation(
            "batch_link_size must be >= 1".to_string(),
        ));
    }

    if config.max_consecutive_page_errors < 1 {
        return Err(ConfigError::Validation(
            "max_consecutive_page_errors must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates timeouts, retry budget and politeness delays
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    for (name, value) in [
        ("timeout", config.timeout),
        ("retry_delay", config.retry_delay),
        ("max_backoff", config.max_backoff),
        ("crawl_delay_min", config.crawl_delay_min),
        ("crawl_delay_max", config.crawl_delay_max),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a non-negative number of seconds, got {}",
                name, value
            )));
        }
    }

    if config.timeout <= 0.0 {
        return Err(ConfigError::Validation("timeout must be > 0".to_string()));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be >= 1.0, got {}",
            config.backoff_factor
        )));
    }

    if config.crawl_delay_min > config.crawl_delay_max {
        return Err(ConfigError::Validation(format!(
            "crawl_delay_min ({}) must not exceed crawl_delay_max ({})",
            config.crawl_delay_min, config.crawl_delay_max
        )));
    }

    Ok(())
}

/// Validates worker pool and checkpoint settings
fn validate_processing_config(config: &ProcessingConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and 64, got {}",
            config.max_workers
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch_size must be >= 1".to_string(),
        ));
    }

    if config.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(
            "checkpoint_interval must be >= 1".to_string(),
        ));
    }

    if config.min_content_length >= config.max_content_length {
        return Err(ConfigError::Validation(format!(
            "min_content_length ({}) must be below max_content_length ({})",
            config.min_content_length, config.max_content_length
        )));
    }

    Ok(())
}

/// Validates language filter policy
fn validate_language_config(config: &LanguageConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("foreign_threshold", config.foreign_threshold),
        ("mixed_content_floor", config.mixed_content_floor),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 0 and 1, got {}",
                name, value
            )));
        }
    }

    if matches!(&config.foreign_words, Some(words) if words.is_empty()) {
        return Err(ConfigError::Validation(
            "foreign_words, when given, cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.data_dir.is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }

    if config.corpus_file.is_empty() || config.corpus_file.contains(['/', '\\']) {
        return Err(ConfigError::Validation(format!(
            "corpus_file must be a plain file name, got '{}'",
            config.corpus_file
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
