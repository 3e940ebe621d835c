//! Source URL resolution
//!
//! Maps a caller-supplied `src` URL onto one of:
//! - an object-store location (bucket + key), or
//! - a plain HTTP URL to fetch as is
//!
//! Only hosts covered by a configured rule are accepted. Rules are evaluated
//! in order and the first host match decides.

use regex::Regex;
use url::Url;

use crate::config::SourceConfig;

/// Character class a `*` in a host pattern expands to
const WILDCARD_CLASS: &str = "[a-zA-Z0-9-]+";

/// Errors returned by [`SourceResolver::resolve`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("invalid source URL: {0}")]
    InvalidUrl(String),

    #[error("source URL not allowed: {0}")]
    NotAllowed(String),
}

/// Where a resolved source should be read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    ObjectStore { bucket: String, key: String },
    Http { url: String },
}

/// What a matching rule does with the URL
#[derive(Debug, Clone)]
pub enum SourceTarget {
    /// Fixed bucket, key taken from the URL path. Empty means plain HTTP.
    Bucket(String),
    /// Full-URL regex whose two capture groups are bucket and key
    Matcher(Regex),
}

/// One compiled `allowed_sources` entry
#[derive(Debug, Clone)]
pub struct SourceRule {
    host_pattern: Regex,
    target: SourceTarget,
}

/// Convert a host glob (`*.example.com`) into an anchored prefix regex.
pub fn glob_to_regex(pattern: &str) -> String {
    let escaped = pattern.replace('.', "\\.").replace('*', WILDCARD_CLASS);
    format!("^{escaped}.*$")
}

impl SourceRule {
    pub fn new(host_pattern: Regex, target: SourceTarget) -> Self {
        Self {
            host_pattern,
            target,
        }
    }

    /// Compile a configured entry, checking the matcher's capture groups.
    pub fn compile(config: &SourceConfig) -> Result<Self, String> {
        if config.pattern.is_empty() {
            return Err("allowed source pattern cannot be empty".to_string());
        }

        let host_pattern = Regex::new(&glob_to_regex(&config.pattern))
            .map_err(|e| format!("error compiling pattern {}: {}", config.pattern, e))?;

        let bucket = config.bucket.clone().unwrap_or_default();

        let target = match &config.matcher {
            Some(matcher) => {
                if !bucket.is_empty() {
                    return Err(format!(
                        "allowed source '{}' cannot set both bucket and matcher",
                        config.pattern
                    ));
                }
                let re = Regex::new(matcher)
                    .map_err(|e| format!("error compiling matcher {}: {}", matcher, e))?;
                // captures_len counts the implicit whole-match group
                if re.captures_len() != 3 {
                    return Err(format!(
                        "matcher {} must have exactly 2 capture groups (bucket, key), found {}",
                        matcher,
                        re.captures_len() - 1
                    ));
                }
                SourceTarget::Matcher(re)
            }
            None => SourceTarget::Bucket(bucket),
        };

        Ok(Self::new(host_pattern, target))
    }

    pub fn matches_host(&self, host: &str) -> bool {
        self.host_pattern.is_match(host)
    }

}

/// Ordered rule list applied to incoming `src` URLs
#[derive(Debug, Clone, Default)]
pub struct SourceResolver {
    rules: Vec<SourceRule>,
}

impl SourceResolver {
    pub fn new(rules: Vec<SourceRule>) -> Self {
        Self { rules }
    }

    pub fn from_configs(configs: &[SourceConfig]) -> Result<Self, String> {
        let rules = configs
            .iter()
            .map(SourceRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    pub fn resolve(&self, url: &str) -> Result<ResolvedSource, SourceError> {
        // `src` arrives percent-decoded, so the parser must tolerate spaces
        let parsed = Url::parse(url).map_err(|_| SourceError::InvalidUrl(url.to_string()))?;

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(SourceError::InvalidUrl(url.to_string())),
        };

        let rule = self
            .rules
            .iter()
            .find(|rule| rule.matches_host(host))
            .ok_or_else(|| SourceError::NotAllowed(url.to_string()))?;

        let (bucket, key) = match &rule.target {
            SourceTarget::Matcher(matcher) => {
                let captures = matcher
                    .captures(url)
                    .ok_or_else(|| SourceError::InvalidUrl(url.to_string()))?;
                match (captures.get(1), captures.get(2)) {
                    (Some(bucket), Some(key)) => {
                        (bucket.as_str().to_string(), key.as_str().to_string())
                    }
                    _ => return Err(SourceError::InvalidUrl(url.to_string())),
                }
            }
            SourceTarget::Bucket(bucket) => (bucket.clone(), path_key(parsed.path())),
        };

        if bucket.is_empty() {
            return Ok(ResolvedSource::Http {
                url: url.to_string(),
            });
        }

        Ok(ResolvedSource::ObjectStore { bucket, key })
    }
}

/// Decoded URL path without its leading slash.
fn path_key(path: &str) -> String {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    urlencoding::decode(trimmed)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| trimmed.to_string())
}
