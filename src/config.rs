//! Environment-driven settings for the `jam` binary.

use std::{env, fmt, path::PathBuf};

const OUTPUT_ENV: &str = "JAM_OUTPUT";
const ENTRY_ENV: &str = "JAM_ENTRY";
const LOG_ENV: &str = "JAM_LOG";
const LOG_FORMAT_ENV: &str = "JAM_LOG_FORMAT";

pub const DEFAULT_OUTPUT: &str = "output";
pub const DEFAULT_ENTRY: &str = "main";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Where a setting's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    Env(&'static str),
    Default,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingSource::Env(var) => write!(f, "explicit {var}"),
            SettingSource::Default => write!(f, "built-in default"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A resolved value plus its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting<T> {
    pub value: T,
    pub source: SettingSource,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub output: Setting<PathBuf>,
    pub entry: Setting<String>,
    pub log_level: Setting<String>,
    pub log_format: Setting<LogFormat>,
}

impl Settings {
    /// Read every `JAM_*` variable. Unset or blank variables fall back to defaults;
    /// an unrecognised `JAM_LOG_FORMAT` is treated as `text`.
    pub fn from_env() -> Self {
        let output = lookup(OUTPUT_ENV, DEFAULT_OUTPUT);
        let entry = lookup(ENTRY_ENV, DEFAULT_ENTRY);
        let log_level = lookup(LOG_ENV, DEFAULT_LOG_LEVEL);
        let format = lookup(LOG_FORMAT_ENV, "text");
        let log_format = Setting {
            value: if format.value.eq_ignore_ascii_case("json") { LogFormat::Json } else { LogFormat::Text },
            source: format.source,
        };

        Self {
            output: Setting { value: PathBuf::from(output.value), source: output.source },
            entry,
            log_level,
            log_format,
        }
    }

    /// Executable path for build mode.
    pub fn output_path(&self) -> &PathBuf {
        &self.output.value
    }

    /// Object file written next to the executable.
    pub fn object_path(&self) -> PathBuf {
        self.output.value.with_extension("o")
    }
}

fn lookup(var: &'static str, default: &str) -> Setting<String> {
    env::var(var)
        .ok()
        .map(|raw| raw.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(|value| Setting { value, source: SettingSource::Env(var) })
        .unwrap_or_else(|| Setting { value: default.to_owned(), source: SettingSource::Default })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env_vars() {
        for key in [OUTPUT_ENV, ENTRY_ENV, LOG_ENV, LOG_FORMAT_ENV] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_when_unset() {
        clear_env_vars();
        let settings = Settings::from_env();
        assert_eq!(settings.output_path(), &PathBuf::from("output"));
        assert_eq!(settings.object_path(), PathBuf::from("output.o"));
        assert_eq!(settings.entry.value, "main");
        assert_eq!(settings.entry.source, SettingSource::Default);
        assert_eq!(settings.log_level.value, "warn");
        assert_eq!(settings.log_format.value, LogFormat::Text);
    }

    #[test]
    #[serial]
    fn explicit_vars_win() {
        clear_env_vars();
        env::set_var(OUTPUT_ENV, "build/hello");
        env::set_var(ENTRY_ENV, " start ");
        env::set_var(LOG_FORMAT_ENV, "JSON");
        let settings = Settings::from_env();
        assert_eq!(settings.object_path(), PathBuf::from("build/hello.o"));
        assert_eq!(settings.entry.value, "start");
        assert_eq!(settings.entry.source, SettingSource::Env(ENTRY_ENV));
        assert_eq!(settings.log_format.value, LogFormat::Json);
        assert_eq!(settings.output.source.to_string(), "explicit JAM_OUTPUT");
        clear_env_vars();
    }

    #[test]
    #[serial]
    fn blank_var_falls_back() {
        clear_env_vars();
        env::set_var(LOG_ENV, "   ");
        let settings = Settings::from_env();
        assert_eq!(settings.log_level.value, DEFAULT_LOG_LEVEL);
        assert_eq!(settings.log_level.source.to_string(), "built-in default");
        clear_env_vars();
    }
}
