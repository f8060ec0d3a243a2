//! Rename settings and folder filtering loaded from TOML.
//!
//! # Configuration File Format
//!
//! ```toml
//! [rename]
//! mode = "title"            # title | lower | upper | datetime
//! use_minor_words = true
//! minor_words = ["a", "an", "the", "of"]
//! replace_spaces = false
//! strip_punctuation = false
//! replace_special = false
//! special_chars = ["<", ">", ":", "\"", "/", "\\", "|", "?", "*"]
//! datetime_format = "%Y%m%d-%H%M%S"
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.part"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Filters only apply when a folder is expanded into its files. Files named
//! directly on the command line are always taken.

use crate::transform::{
    self, CaseMode, DEFAULT_DATETIME_FORMAT, DEFAULT_MINOR_WORDS, DEFAULT_SPECIAL_CHARS,
    TransformError, TransformOptions,
};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const LOCAL_CONFIG_NAME: &str = ".namedroprc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("Invalid special character entry '{0}': expected a single character")]
    InvalidSpecialChar(String),

    #[error(transparent)]
    InvalidRule(#[from] TransformError),

    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedropConfig {
    #[serde(default)]
    pub rename: RenameSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// The `[rename]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameSettings {
    pub mode: CaseMode,
    pub use_minor_words: bool,
    pub minor_words: Vec<String>,
    pub replace_spaces: bool,
    pub strip_punctuation: bool,
    pub replace_special: bool,
    /// One character per entry; control characters are always added.
    pub special_chars: Vec<String>,
    pub datetime_format: String,
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            mode: CaseMode::Title,
            use_minor_words: true,
            minor_words: DEFAULT_MINOR_WORDS.iter().map(|w| w.to_string()).collect(),
            replace_spaces: false,
            strip_punctuation: false,
            replace_special: false,
            special_chars: DEFAULT_SPECIAL_CHARS.iter().map(|c| c.to_string()).collect(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }
}

/// Command-line values that win over the configuration file.
///
/// Boolean switches can only turn a rule on, except `no_minor_words` which
/// turns minor-word handling off.
#[derive(Debug, Clone, Default)]
pub struct RenameOverrides {
    pub mode: Option<CaseMode>,
    pub no_minor_words: bool,
    pub replace_spaces: bool,
    pub strip_punctuation: bool,
    pub replace_special: bool,
    pub datetime_format: Option<String>,
}

impl RenameSettings {
    pub fn apply_overrides(&mut self, overrides: &RenameOverrides) {
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if overrides.no_minor_words {
            self.use_minor_words = false;
        }
        self.replace_spaces |= overrides.replace_spaces;
        self.strip_punctuation |= overrides.strip_punctuation;
        self.replace_special |= overrides.replace_special;
        if let Some(format) = &overrides.datetime_format {
            self.datetime_format = format.clone();
        }
    }

    /// Validates the settings and turns them into transformation options.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad datetime format or a special character
    /// entry that is not exactly one character.
    pub fn to_transform_options(&self) -> Result<TransformOptions, ConfigError> {
        transform::validate_datetime_format(&self.datetime_format)?;

        let mut specials = Vec::with_capacity(self.special_chars.len());
        for entry in &self.special_chars {
            let mut chars = entry.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => specials.push(c),
                _ => return Err(ConfigError::InvalidSpecialChar(entry.clone())),
            }
        }

        Ok(TransformOptions {
            mode: self.mode,
            use_minor_words: self.use_minor_words,
            minor_words: transform::normalize_minor_words(
                self.minor_words.iter().map(String::as_str),
            ),
            replace_spaces: self.replace_spaces,
            strip_punctuation: self.strip_punctuation,
            replace_special: self.replace_special,
            special_chars: transform::with_control_chars(specials),
            datetime_format: self.datetime_format.clone(),
        })
    }
}

/// Folder expansion rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist; overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns, e.g. "*.part".
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, matched case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl NamedropConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, when given
    /// 2. `.namedroprc.toml` in the current directory
    /// 3. `~/.config/namedrop/config.toml`
    /// 4. built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a file is found (or explicitly given) but cannot
    /// be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("namedrop")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        debug!(path = %path.display(), "loading configuration");
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Default)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl FilterRules {
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern)
                        .map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_regexes = self
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledFilters {
            enable_hidden_files: self.enable_hidden_files,
            exclude_filenames: self.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: self
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&self.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&self.include.patterns)?,
        })
    }
}

impl CompiledFilters {
    /// Whether a file found inside a folder should join the rename list.
    ///
    /// Include patterns win; otherwise hidden files, exact names,
    /// extensions, globs and regexes exclude, in that order.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
