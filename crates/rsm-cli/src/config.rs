//! Run configuration
//!
//! Built from the built-in source list, an optional TOML file and CLI
//! overrides, in that order of increasing precedence. Everything is
//! validated once here; the pipeline never sees a malformed source.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use rsm_compiler::DEFAULT_HEADER_LINES;

pub const DEFAULT_OUTPUT: &str = "AIs_merged.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_JOBS: usize = 1;

const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("win-update", "https://raw.githubusercontent.com/ForestL18/rules-dat/main/ai.txt"),
    (
        "category-games-cn",
        "https://raw.githubusercontent.com/MetaCubeX/meta-rules-dat/meta/geo/geosite/openai.txt",
    ),
    ("steamcn", "https://ruleset.skk.moe/List/domainset/ai.conf"),
    ("nvidia", "https://raw.githubusercontent.com/DustinWin/ruleset_geodata/main/rules/ai.txt"),
    ("cn_site", "https://raw.githubusercontent.com/ForestL18/rules-dat/main/ai.txt"),
    (
        "chinadomains",
        "https://raw.githubusercontent.com/MetaCubeX/meta-rules-dat/meta/geo/geosite/openai.txt",
    ),
];

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("No rule sources configured")]
    NoSources,
    #[error("Source name must not be empty (url: {url})")]
    EmptyName { url: String },
    #[error("Duplicate source name '{0}'")]
    DuplicateName(String),
    #[error("Invalid URL for source '{name}': {reason}")]
    InvalidUrl { name: String, reason: String },
    #[error("Unsupported scheme '{scheme}' for source '{name}' (expected http, https or file)")]
    UnsupportedScheme { name: String, scheme: String },
    #[error("Invalid source '{0}': expected NAME=URL")]
    SourceArg(String),
    #[error("{0} must be at least 1")]
    Zero(&'static str),
}

/// A named rule list location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSource {
    pub name: String,
    pub url: Url,
}

impl RuleSource {
    pub fn new(name: &str, url: &str) -> Result<Self, ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::EmptyName { url: url.to_string() });
        }

        let url = Url::parse(url.trim()).map_err(|e| ConfigError::InvalidUrl {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" | "file" => {}
            scheme => {
                return Err(ConfigError::UnsupportedScheme {
                    name: name.to_string(),
                    scheme: scheme.to_string(),
                })
            }
        }

        Ok(Self { name: name.to_string(), url })
    }
}

/// Parse a `NAME=URL` command line argument.
pub fn parse_source_arg(arg: &str) -> Result<RuleSource, ConfigError> {
    let (name, url) = arg
        .split_once('=')
        .ok_or_else(|| ConfigError::SourceArg(arg.to_string()))?;
    RuleSource::new(name, url)
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Replaces the configured source list when non-empty
    pub sources: Vec<RuleSource>,
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    output: Option<PathBuf>,
    timeout_secs: Option<u64>,
    jobs: Option<usize>,
    header: Option<RawHeader>,
    source: Option<Vec<RawSource>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHeader {
    lines: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSource {
    name: String,
    url: String,
}

/// Validated settings for one merge run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fetched and merged in this order
    pub sources: Vec<RuleSource>,
    pub output: PathBuf,
    pub timeout: Duration,
    /// Maximum number of concurrent fetches
    pub jobs: usize,
    pub header_lines: Vec<String>,
}

impl Config {
    /// Built-in settings and source list.
    pub fn builtin() -> Result<Self, ConfigError> {
        Ok(Self {
            sources: default_sources()?,
            output: PathBuf::from(DEFAULT_OUTPUT),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            jobs: DEFAULT_JOBS,
            header_lines: DEFAULT_HEADER_LINES.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Defaults, then the optional file, then the overrides.
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::builtin()?,
        };
        config.with_overrides(overrides)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded {} sources from '{}'", config.sources.len(), path.display());
        Ok(config)
    }

    /// Parse a TOML document. Omitted keys keep their defaults; a file
    /// without any `[[source]]` table keeps the built-in source list.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        let mut config = Self::builtin()?;

        if let Some(output) = raw.output {
            config.output = output;
        }
        if let Some(secs) = raw.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(jobs) = raw.jobs {
            config.jobs = jobs;
        }
        if let Some(header) = raw.header {
            config.header_lines = header.lines;
        }
        if let Some(sources) = raw.source {
            config.sources = sources
                .iter()
                .map(|s| RuleSource::new(&s.name, &s.url))
                .collect::<Result<_, _>>()?;
        }

        config.validate()
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if !overrides.sources.is_empty() {
            self.sources = overrides.sources;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateName(source.name.clone()));
            }
        }

        if self.jobs == 0 {
            return Err(ConfigError::Zero("jobs"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Zero("timeout_secs"));
        }

        Ok(self)
    }
}

/// Built-in upstream rule lists.
pub fn default_sources() -> Result<Vec<RuleSource>, ConfigError> {
    sources_from_pairs(DEFAULT_SOURCES)
}

fn sources_from_pairs(pairs: &[(&str, &str)]) -> Result<Vec<RuleSource>, ConfigError> {
    pairs
        .iter()
        .map(|(name, url)| RuleSource::new(name, url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::builtin()
            .and_then(Config::validate)
            .expect("defaults should validate");
        assert_eq!(config.sources.len(), DEFAULT_SOURCES.len());
        assert_eq!(config.sources[0].name, "win-update");
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(config.jobs, 1);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_sources_keep_file_order() {
        let config = Config::from_toml_str(
            r#"
            output = "out/rules.txt"
            jobs = 3

            [header]
            lines = ["My Rules"]

            [[source]]
            name = "zeta"
            url = "https://example.com/z.txt"

            [[source]]
            name = "alpha"
            url = "file:///tmp/a.txt"
            "#,
        )
        .expect("config should parse");

        let names: Vec<_> = config.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(config.output, PathBuf::from("out/rules.txt"));
        assert_eq!(config.jobs, 3);
        assert_eq!(config.header_lines, vec!["My Rules".to_string()]);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_file_without_sources_keeps_defaults() {
        let config = Config::from_toml_str("timeout_secs = 5").expect("config should parse");
        assert_eq!(config.sources, default_sources().expect("built-in sources"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_source_list_rejected() {
        let err = Config::from_toml_str("source = []").unwrap_err();
        assert!(matches!(err, ConfigError::NoSources));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Config::from_toml_str(
            r#"
            [[source]]
            name = "a"
            url = "https://example.com/1.txt"
            [[source]]
            name = "a"
            url = "https://example.com/2.txt"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(ref n) if n == "a"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = Config::from_toml_str(
            r#"
            [[source]]
            name = "a"
            url = "https://example.com/1.txt"
            weight = 2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_bad_sources_rejected() {
        assert!(matches!(
            RuleSource::new("a", "not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            RuleSource::new("a", "ftp://example.com/a.txt"),
            Err(ConfigError::UnsupportedScheme { ref scheme, .. }) if scheme == "ftp"
        ));
        assert!(matches!(
            RuleSource::new("  ", "https://example.com/a.txt"),
            Err(ConfigError::EmptyName { .. })
        ));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let err = Config::builtin()
            .expect("built-in config")
            .with_overrides(Overrides { jobs: Some(0), ..Overrides::default() })
            .unwrap_err();
        assert!(matches!(err, ConfigError::Zero("jobs")));
    }

    #[test]
    fn test_malformed_builtin_entry_is_an_error() {
        let err = sources_from_pairs(&[
            ("good", "https://example.com/good.txt"),
            ("bad", "not a url"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { ref name, .. } if name == "bad"));

        let err = sources_from_pairs(&[("", "https://example.com/a.txt")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyName { .. }));
    }

    #[test]
    fn test_parse_source_arg() {
        let source = parse_source_arg("skk=https://ruleset.skk.moe/List/domainset/ai.conf")
            .expect("argument should parse");
        assert_eq!(source.name, "skk");
        assert_eq!(source.url.host_str(), Some("ruleset.skk.moe"));

        assert!(matches!(
            parse_source_arg("https://example.com"),
            Err(ConfigError::SourceArg(_))
        ));
    }

    #[test]
    fn test_overrides_replace_sources() {
        let only =
            parse_source_arg("only=https://example.com/only.txt").expect("argument should parse");
        let config = Config::resolve(
            None,
            Overrides {
                sources: vec![only.clone()],
                output: Some(PathBuf::from("x.txt")),
                timeout_secs: Some(10),
                jobs: Some(2),
            },
        )
        .expect("overrides should validate");

        assert_eq!(config.sources, vec![only]);
        assert_eq!(config.output, PathBuf::from("x.txt"));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.jobs, 2);
    }

    #[test]
    fn test_missing_file_reported() {
        let err = Config::load(Path::new("/nonexistent/rsm.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
