//! Runner configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::use_cases::preview::PreviewOptions;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Stories index JSON (`{"v": 3, "stories": {...}}`)
    pub index_path: PathBuf,
    /// Directory story module import paths resolve against
    pub stories_dir: PathBuf,
    /// Persisted selection, as a URL query
    pub selection: String,
    pub cache_all_csf_files: bool,
    pub emit_legacy_stories: bool,
    /// How long the runner waits for the first render
    pub render_timeout: Duration,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("stories/index.json"),
            stories_dir: PathBuf::from("stories"),
            selection: "id=*".to_string(),
            cache_all_csf_files: false,
            emit_legacy_stories: false,
            render_timeout: Duration::from_secs(10),
        }
    }
}

impl PreviewConfig {
    /// Read `STORYFRAME_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`PreviewConfig::from_env`], reading through `lookup`. Unset or
    /// blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let render_timeout = match get("STORYFRAME_RENDER_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(value.parse().map_err(|_| ConfigError::Invalid {
                key: "STORYFRAME_RENDER_TIMEOUT_SECS",
                value: value.clone(),
                reason: "expected whole seconds",
            })?),
            None => defaults.render_timeout,
        };

        Ok(Self {
            index_path: get("STORYFRAME_INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_path),
            stories_dir: get("STORYFRAME_STORIES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.stories_dir),
            selection: get("STORYFRAME_SELECTION").unwrap_or(defaults.selection),
            cache_all_csf_files: parse_flag(
                "STORYFRAME_CACHE_ALL_CSF_FILES",
                get("STORYFRAME_CACHE_ALL_CSF_FILES"),
            )?
            .unwrap_or(defaults.cache_all_csf_files),
            emit_legacy_stories: parse_flag(
                "STORYFRAME_EMIT_LEGACY_STORIES",
                get("STORYFRAME_EMIT_LEGACY_STORIES"),
            )?
            .unwrap_or(defaults.emit_legacy_stories),
            render_timeout,
        })
    }

    pub fn preview_options(&self) -> PreviewOptions {
        PreviewOptions {
            cache_all_csf_files: self.cache_all_csf_files,
            emit_legacy_stories: self.emit_legacy_stories,
        }
    }
}

fn parse_flag(key: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected true or false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = PreviewConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PreviewConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = PreviewConfig::from_lookup(lookup(&[
            ("STORYFRAME_INDEX_PATH", "/srv/index.json"),
            ("STORYFRAME_STORIES_DIR", "/srv/stories"),
            ("STORYFRAME_SELECTION", "id=button--primary&viewMode=docs"),
            ("STORYFRAME_CACHE_ALL_CSF_FILES", "true"),
            ("STORYFRAME_EMIT_LEGACY_STORIES", "1"),
            ("STORYFRAME_RENDER_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.index_path, PathBuf::from("/srv/index.json"));
        assert_eq!(config.stories_dir, PathBuf::from("/srv/stories"));
        assert_eq!(config.selection, "id=button--primary&viewMode=docs");
        assert!(config.cache_all_csf_files);
        assert!(config.preview_options().emit_legacy_stories);
        assert_eq!(config.render_timeout, Duration::from_secs(3));
    }

    #[test]
    fn blank_values_keep_defaults() {
        let config =
            PreviewConfig::from_lookup(lookup(&[("STORYFRAME_SELECTION", "  ")])).unwrap();
        assert_eq!(config.selection, "id=*");
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = PreviewConfig::from_lookup(lookup(&[("STORYFRAME_EMIT_LEGACY_STORIES", "maybe")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "STORYFRAME_EMIT_LEGACY_STORIES", .. }
        ));

        assert!(
            PreviewConfig::from_lookup(lookup(&[("STORYFRAME_RENDER_TIMEOUT_SECS", "soon")]))
                .is_err()
        );
    }
}
