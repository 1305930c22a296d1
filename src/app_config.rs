//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// TOML-backed file configuration for archive connection defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Archive hostname, optionally with an `http://` or `https://` prefix.
    pub hostname: Option<String>,
    /// Archive HTTP port.
    pub port: Option<u16>,
    /// User name for HTTP Basic authentication.
    pub username: Option<String>,
    /// Password for HTTP Basic authentication.
    pub password: Option<String>,
    /// Use HTTPS instead of HTTP.
    pub https: Option<bool>,
    /// Path of the WADO endpoint on the archive (default `wado`).
    pub path: Option<String>,
    /// Default output directory for downloads.
    pub output_dir: Option<PathBuf>,
    /// Transfer syntax UID requested for every object.
    pub transfer_syntax: Option<String>,
    /// Submit credentials to the servlet form login when a login page is served.
    pub form_login: Option<bool>,
    /// Total request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// Maximum size of a downloaded object in bytes.
    pub max_body_bytes: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if self.port == Some(0) {
            bail!("Invalid config value for `port`: 0. Expected range: 1..=65535");
        }
        if let Some(hostname) = &self.hostname
            && hostname.trim().is_empty()
        {
            bail!("Invalid config value for `hostname`: must not be empty");
        }
        if let Some(username) = &self.username
            && username.is_empty()
        {
            bail!("Invalid config value for `username`: must not be empty");
        }
        validate_timeout_secs("timeout_secs", self.timeout_secs)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        if self.max_body_bytes == Some(0) {
            bail!("Invalid config value for `max_body_bytes`: 0. Expected a positive size");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Log filter directive for this verbosity.
    #[must_use]
    pub fn log_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/wado/config.toml`
/// 2. `$HOME/.config/wado/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("wado").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("wado")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config named on the command line, or the default one if present.
///
/// An explicit path must exist; a missing default file means "no config".
pub fn load_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return load_file_config(path).map(Some);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let context = || format!("Invalid `{key}` value on line {}", line_index + 1);

        match key {
            "hostname" => cfg.hostname = Some(parse_string_literal(value).with_context(context)?),
            "port" => {
                let parsed = parse_integer_u64(value).with_context(context)?;
                let port = u16::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("port out of range for u16"))
                    .with_context(context)?;
                cfg.port = Some(port);
            }
            "username" => cfg.username = Some(parse_string_literal(value).with_context(context)?),
            "password" => cfg.password = Some(parse_string_literal(value).with_context(context)?),
            "https" => cfg.https = Some(parse_boolean(value).with_context(context)?),
            "path" => cfg.path = Some(parse_string_literal(value).with_context(context)?),
            "output_dir" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.output_dir = Some(PathBuf::from(parsed));
            }
            "transfer_syntax" => {
                cfg.transfer_syntax = Some(parse_string_literal(value).with_context(context)?);
            }
            "form_login" => cfg.form_login = Some(parse_boolean(value).with_context(context)?),
            "timeout_secs" => {
                cfg.timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "max_body_bytes" => {
                cfg.max_body_bytes = Some(parse_integer_u64(value).with_context(context)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!(
                        "Invalid `verbosity` value '{}' on line {}",
                        parsed,
                        line_index + 1
                    )
                })?);
            }
            unknown => {
                bail!(
                    "Unknown configuration key: '{}' on line {}",
                    unknown,
                    line_index + 1
                );
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_full_connection() {
        let cfg = parse_config_str(
            r#"
hostname = "pacs.example.org"
port = 8080
username = "viewer"
password = "p#ss" # hash inside quotes is kept
https = true
path = "dcm4chee-arc/wado/DCM4CHEE"
output_dir = "/data/dicom"
transfer_syntax = "1.2.840.10008.1.2.1"
form_login = false
timeout_secs = 60
connect_timeout_secs = 10
max_body_bytes = 1073741824
verbosity = "verbose"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.hostname.as_deref(), Some("pacs.example.org"));
        assert_eq!(cfg.port, Some(8080));
        assert_eq!(cfg.username.as_deref(), Some("viewer"));
        assert_eq!(cfg.password.as_deref(), Some("p#ss"));
        assert_eq!(cfg.https, Some(true));
        assert_eq!(cfg.path.as_deref(), Some("dcm4chee-arc/wado/DCM4CHEE"));
        assert_eq!(cfg.output_dir, Some(PathBuf::from("/data/dicom")));
        assert_eq!(cfg.transfer_syntax.as_deref(), Some("1.2.840.10008.1.2.1"));
        assert_eq!(cfg.form_login, Some(false));
        assert_eq!(cfg.timeout_secs, Some(60));
        assert_eq!(cfg.connect_timeout_secs, Some(10));
        assert_eq!(cfg.max_body_bytes, Some(1_073_741_824));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
    }

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str("port = 104\n").expect("partial config should parse");
        assert_eq!(cfg.port, Some(104));
        assert!(cfg.hostname.is_none());
        assert!(cfg.output_dir.is_none());
    }

    #[test]
    fn test_parse_config_rejects_port_zero() {
        let err = parse_config_str("port = 0").expect_err("port 0 must be rejected");
        assert!(err.to_string().contains("port"), "got: {err}");
    }

    #[test]
    fn test_parse_config_rejects_port_too_large() {
        let err = parse_config_str("port = 65536").expect_err("port above u16 must be rejected");
        assert!(err.to_string().contains("port"), "got: {err}");
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("timeout_secs = 4 trailing")
            .expect_err("expected trailing token error");
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err = parse_config_str("connect_timeout_secs = 0")
            .expect_err("invalid timeout expected");
        assert!(err.to_string().contains("connect_timeout_secs"));

        let err = parse_config_str("timeout_secs = 3601").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_zero_max_body_bytes() {
        let err = parse_config_str("max_body_bytes = 0").expect_err("zero limit rejected");
        assert!(err.to_string().contains("max_body_bytes"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_string() {
        let err = parse_config_str("hostname = pacs").expect_err("unquoted string rejected");
        assert!(err.to_string().contains("hostname"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_boolean() {
        let err = parse_config_str("form_login = yes").expect_err("invalid boolean expected");
        assert!(err.to_string().contains("form_login"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("unknown_key = 123").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("unknown_key"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("hostname").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_verbosity_log_level() {
        assert_eq!(VerbositySetting::Default.log_level(), "info");
        assert_eq!(VerbositySetting::Verbose.log_level(), "debug");
        assert_eq!(VerbositySetting::Quiet.log_level(), "error");
        assert_eq!(VerbositySetting::Debug.log_level(), "trace");
    }

    #[test]
    fn test_load_config_explicit_path_must_exist() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let missing = temp_dir.path().join("missing.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_config_reads_explicit_file() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "hostname = \"archive\"\nport = 8080\n").expect("write config");

        let cfg = load_config(Some(&path))
            .expect("config should load")
            .expect("config should be present");
        assert_eq!(cfg.hostname.as_deref(), Some("archive"));
        assert_eq!(cfg.port, Some(8080));
    }
}
