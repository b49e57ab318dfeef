//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `UPRANGE_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`, optional)
//! 2. **Environment variables** - Variables prefixed with `UPRANGE_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `UPRANGE_LIMITS__MAX_FILE_SIZE=1048576` sets the `limits.max_file_size` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use uprange::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Uploads land in {}", config.upload_dir_path().display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! UPRANGE_PORT=9000
//! UPRANGE_APP_ROOT=/srv/range
//! UPRANGE_LIMITS__MAX_REQUEST_SIZE=52428800
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "UPRANGE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty (or missing) config file yields a runnable server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Application root path. The upload directory is created beneath it.
    pub app_root: PathBuf,
    /// Name of the upload directory under `app_root`
    pub upload_dir: String,
    /// Multipart size limits enforced before any part is stored
    pub limits: UploadLimits,
    /// Export traces over OTLP (configured via the standard OTEL_* environment variables)
    pub enable_otel_export: bool,
}

/// Multipart intake limits.
///
/// Enforced while the body streams, so an oversized request is rejected before the upload
/// handler touches the filesystem.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadLimits {
    /// Parts up to this many bytes stay in memory; larger parts spool to a temp file.
    /// Default: 1MB
    pub file_size_threshold: u64,
    /// Maximum size in bytes of a single part.
    /// Default: 20MB
    pub max_file_size: u64,
    /// Maximum size in bytes of the whole request body.
    /// Default: 100MB
    pub max_request_size: u64,
    /// Directory for spooled parts. Uses the system temp directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spool_dir: Option<PathBuf>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            file_size_threshold: 1024 * 1024,    // 1MB
            max_file_size: 20 * 1024 * 1024,     // 20MB
            max_request_size: 100 * 1024 * 1024, // 100MB
            spool_dir: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            app_root: PathBuf::from("."),
            upload_dir: "webapp".to_string(),
            limits: UploadLimits::default(),
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.upload_dir.trim().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: upload_dir must not be empty".to_string(),
            });
        }

        let limits = &self.limits;
        if limits.file_size_threshold > limits.max_file_size {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: file_size_threshold ({}) cannot be greater than max_file_size ({})",
                    limits.file_size_threshold, limits.max_file_size
                ),
            });
        }
        if limits.max_file_size > limits.max_request_size {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: max_file_size ({}) cannot be greater than max_request_size ({})",
                    limits.max_file_size, limits.max_request_size
                ),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            // UPRANGE_CONFIG names the file itself and is consumed by clap
            .merge(Env::prefixed("UPRANGE_").split("__").ignore(&["config"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Directory uploads are written to: `<app_root>/<upload_dir>`
    pub fn upload_dir_path(&self) -> PathBuf {
        self.app_root.join(&self.upload_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.port, 8080);
            assert_eq!(config.upload_dir, "webapp");
            assert_eq!(config.limits.file_size_threshold, 1024 * 1024);
            assert_eq!(config.limits.max_file_size, 20 * 1024 * 1024);
            assert_eq!(config.limits.max_request_size, 100 * 1024 * 1024);
            assert_eq!(config.upload_dir_path(), PathBuf::from("./webapp"));

            Ok(())
        });
    }

    #[test]
    fn test_yaml_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 9000
app_root: /srv/range
limits:
  max_file_size: 4096
"#,
            )?;

            jail.set_env("UPRANGE_HOST", "127.0.0.1");
            jail.set_env("UPRANGE_LIMITS__FILE_SIZE_THRESHOLD", "1024");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 9000);
            assert_eq!(config.limits.max_file_size, 4096);
            assert_eq!(config.limits.file_size_threshold, 1024);
            // untouched nested values keep their defaults
            assert_eq!(config.limits.max_request_size, 100 * 1024 * 1024);
            assert_eq!(config.upload_dir_path(), PathBuf::from("/srv/range/webapp"));
            assert_eq!(config.bind_address(), "127.0.0.1:9000");

            Ok(())
        });
    }

    #[test]
    fn test_threshold_above_max_file_size_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
limits:
  file_size_threshold: 2048
  max_file_size: 1024
"#,
            )?;

            let err = Config::load(&args("test.yaml")).unwrap_err();
            assert!(err.to_string().contains("file_size_threshold"));

            Ok(())
        });
    }

    #[test]
    fn test_max_file_size_above_request_size_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("UPRANGE_LIMITS__MAX_REQUEST_SIZE", "10");

            let err = Config::load(&args("config.yaml")).unwrap_err();
            assert!(err.to_string().contains("max_request_size"));

            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "upload_directory: uploads\n")?;

            assert!(Config::load(&args("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_empty_upload_dir_is_rejected() {
        let config = Config {
            upload_dir: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
