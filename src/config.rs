//! Configuration loading and goal-catalog resolution.
//!
//! Configuration lives in `$XDG_CONFIG_HOME/taskbeacon/config.toml` (falling
//! back to `~/.config/taskbeacon/config.toml`). A missing file is not an
//! error: defaults plus the embedded beacon catalog are used so the tool
//! works out of the box. The loaded [`Config`] is immutable and shared by
//! reference with the orchestrators and the focus balancer.

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub projects: Vec<ProjectRule>,
    #[serde(default)]
    pub beacons: Vec<Beacon>,
    #[serde(default)]
    pub focus_groups: Vec<FocusGroup>,
    /// Tasks drawn per project/group into the focus view when no explicit
    /// quota is configured.
    #[serde(default)]
    pub default_quota: usize,
}

/// Suggestion-service backend settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    /// anthropic, openai or ollama.
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: String,
    /// Override endpoint, used for ollama or self-hosted gateways.
    #[serde(default)]
    pub base_url: String,
}

/// A known project: name, keyword hints for the suggestion prompt, and an
/// optional focus quota.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectRule {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub quota: usize,
}

/// A named bucket of projects for the focus view, defined by glob patterns.
/// A leading `!` marks an exclusion pattern.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FocusGroup {
    pub name: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub quota: usize,
}

/// A top-level life goal a task can align with.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Beacon {
    pub name: String,
    /// Unique tag, conventionally prefixed `b.`.
    pub tag: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub directions: Vec<Direction>,
}

/// A specific path or skill contributing to a beacon.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Direction {
    pub name: String,
    /// Unique tag, conventionally prefixed `d.`.
    pub tag: String,
    #[serde(default)]
    pub description: String,
}

impl Config {
    /// Load configuration from the default location, applying defaults for
    /// anything unset. A missing config file yields the built-in defaults.
    pub fn load() -> Result<Config, ConfigError> {
        match config_path() {
            Some(path) if path.exists() => {
                let display = path.display().to_string();
                let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                    path: display.clone(),
                    source,
                })?;
                let cfg: Config =
                    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                        path: display,
                        source,
                    })?;
                Ok(cfg.with_defaults())
            }
            _ => {
                tracing::debug!("no config file found, using defaults");
                Ok(Config::default().with_defaults())
            }
        }
    }

    /// Fill in defaults for any field left empty by the config file.
    pub fn with_defaults(mut self) -> Config {
        if self.llm.provider.is_empty() {
            self.llm.provider = "anthropic".into();
        }
        if self.llm.model.is_empty() {
            self.llm.model = default_model_for(&self.llm.provider).into();
        }
        if self.llm.api_key_env.is_empty() {
            self.llm.api_key_env = match self.llm.provider.as_str() {
                "openai" => "OPENAI_API_KEY".into(),
                _ => "ANTHROPIC_API_KEY".into(),
            };
        }
        if self.beacons.is_empty() {
            self.beacons = default_beacons();
        }
        if self.default_quota == 0 {
            self.default_quota = 2;
        }
        self
    }

    /// API key from the configured environment variable, if set.
    pub fn api_key(&self) -> Option<String> {
        if self.llm.api_key_env.is_empty() {
            return None;
        }
        env::var(&self.llm.api_key_env).ok().filter(|k| !k.is_empty())
    }

    /// Quota for a project, falling back to the default.
    pub fn project_quota(&self, project: &str) -> usize {
        self.projects
            .iter()
            .find(|p| p.name == project && p.quota > 0)
            .map(|p| p.quota)
            .unwrap_or(self.default_quota)
    }

    /// Quota for a focus group, falling back to the default.
    pub fn focus_group_quota(&self, group: &str) -> usize {
        self.focus_groups
            .iter()
            .find(|g| g.name == group && g.quota > 0)
            .map(|g| g.quota)
            .unwrap_or(self.default_quota)
    }
}

fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4o-mini",
        "ollama" => "llama3.2",
        _ => "claude-sonnet-4-5",
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir).join("taskbeacon").join("config.toml"));
        }
    }
    let home = env::var("HOME").ok()?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("taskbeacon")
            .join("config.toml"),
    )
}

/// Embedded beacon catalog used when the config file defines none.
pub fn default_beacons() -> Vec<Beacon> {
    fn dir(name: &str, tag: &str, description: &str) -> Direction {
        Direction {
            name: name.into(),
            tag: tag.into(),
            description: description.into(),
        }
    }

    vec![
        Beacon {
            name: "Be Organized".into(),
            tag: "b.organized".into(),
            description: "Personal organization and productivity".into(),
            directions: vec![
                dir("Develop organization habits", "d.org.habits", "Routines that keep work flowing"),
                dir("Improve tooling", "d.org.tooling", "Better systems for capturing and tracking work"),
                dir("Time management", "d.time.mgmt", "Prioritisation and calendar discipline"),
                dir("Project planning", "d.project.plan", "Breaking goals into actionable plans"),
            ],
        },
        Beacon {
            name: "Be a Great Software Developer".into(),
            tag: "b.great.dev".into(),
            description: "Excel in software development".into(),
            directions: vec![
                dir("Algorithm skills", "d.algo", "Sharper algorithmic thinking"),
                dir("Software design", "d.sw.design", "Architecture and design patterns"),
                dir("Test writing", "d.test.write", "Stronger testing habits"),
                dir("Dev tooling", "d.dev.tooling", "Editors, debuggers, build systems"),
                dir("OS and networks", "d.os.network", "System-level knowledge"),
            ],
        },
        Beacon {
            name: "Be Healthy".into(),
            tag: "b.healthy".into(),
            description: "Physical and mental health".into(),
            directions: vec![
                dir("Physical endurance", "d.endurance", "Fitness and stamina"),
                dir("Healthy habits", "d.healthy.habits", "Diet, sleep, routines"),
            ],
        },
        Beacon {
            name: "Keep Learning".into(),
            tag: "b.learning".into(),
            description: "Broaden knowledge beyond the day job".into(),
            directions: vec![
                dir("Reading", "d.reading", "Books and long-form material"),
                dir("Writing", "d.writing", "Sharing what was learned"),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_empty_config() {
        let cfg = Config::default().with_defaults();
        assert_eq!(cfg.llm.provider, "anthropic");
        assert_eq!(cfg.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(cfg.default_quota, 2);
        assert!(!cfg.beacons.is_empty());
    }

    #[test]
    fn explicit_values_survive_defaulting() {
        let cfg: Config = toml::from_str::<Config>(
            r#"
            default_quota = 5

            [llm]
            provider = "ollama"
            base_url = "http://localhost:11434"

            [[projects]]
            name = "work"
            keywords = ["JIRA-"]
            quota = 3
            "#,
        )
        .unwrap()
        .with_defaults();
        assert_eq!(cfg.llm.provider, "ollama");
        assert_eq!(cfg.llm.model, "llama3.2");
        assert_eq!(cfg.default_quota, 5);
        assert_eq!(cfg.projects[0].quota, 3);
    }

    #[test]
    fn project_quota_falls_back_to_default() {
        let cfg = Config {
            projects: vec![ProjectRule {
                name: "work".into(),
                quota: 3,
                ..ProjectRule::default()
            }],
            default_quota: 2,
            ..Config::default()
        };
        assert_eq!(cfg.project_quota("work"), 3);
        assert_eq!(cfg.project_quota("home"), 2);
    }

    #[test]
    fn zero_quota_means_unset() {
        let cfg = Config {
            focus_groups: vec![FocusGroup {
                name: "errands".into(),
                patterns: vec!["er.*".into()],
                quota: 0,
            }],
            default_quota: 4,
            ..Config::default()
        };
        assert_eq!(cfg.focus_group_quota("errands"), 4);
    }
}
