use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Parser, Debug)]
#[command(name = "bookmarks")]
#[command(about = "Runs the bookmarks service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookmarks")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    database: String,
    port: u16,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_sync_interval() -> u64 {
    60
}

impl Default for App {
    fn default() -> Self {
        App {
            database: "bookmarks.db".to_string(),
            port: 8080,
            turso_url: None,
            turso_auth_token: None,
            sync_interval_seconds: default_sync_interval(),
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// Replica credentials, if both are set to something non-empty.
    /// `${TURSO_URL:-}` in the config file resolves to an empty string.
    pub fn replica(&self) -> Option<(String, String)> {
        let url = self.turso_url.as_deref().filter(|s| !s.is_empty())?;
        let token = self.turso_auth_token.as_deref().filter(|s| !s.is_empty())?;
        Some((url.to_string(), token.to_string()))
    }
}

/// Identity forwarded by the upstream auth guard.
#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    #[serde(default = "default_user_id_header")]
    pub user_id_header: String,
}

fn default_user_id_header() -> String {
    "x-user-id".to_string()
}

impl Default for Auth {
    fn default() -> Self {
        Auth {
            user_id_header: default_user_id_header(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub auth: Auth,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = %var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}
