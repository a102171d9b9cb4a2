use std::path::PathBuf;

use clap::Parser;

use crate::domain::{Credentials, TwConfig, TwError};

/// Terminal widget bench: a table, forms, a spell checker, a login page,
/// a weather lookup, a stopwatch and a country search.
#[derive(Parser, Debug)]
#[command(name = "tw", version, about)]
pub struct Cli {
    /// CSV file with date, views and article columns
    #[arg(long)]
    pub records: Option<String>,

    #[arg(long, default_value = "https://api.weatherapi.com/v1/current.json")]
    pub weather_url: String,

    /// Key for the weather service
    #[arg(long, env = "TW_WEATHER_KEY", default_value = "", hide_env_values = true)]
    pub weather_key: String,

    #[arg(long, default_value = "https://xcountries-backend.azurewebsites.net/all")]
    pub countries_url: String,

    /// Username accepted by the login page
    #[arg(long, default_value = "user")]
    pub username: String,

    /// Password accepted by the login page
    #[arg(long, default_value = "password")]
    pub password: String,

    /// Event poll time in milliseconds
    #[arg(long = "poll-ms", default_value_t = 100)]
    pub poll_ms: u64,

    /// Write logs to this file, nothing is logged without it
    #[arg(long)]
    pub log_file: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn into_config(self) -> Result<TwConfig, TwError> {
        if self.poll_ms == 0 {
            return Err(TwError::InvalidConfig("--poll-ms must be positive".into()));
        }
        let records = self.records.as_deref().map(expand_path).transpose()?;
        Ok(TwConfig::default()
            .event_poll_time(self.poll_ms)
            .records(records)
            .weather_url(self.weather_url)
            .weather_key(self.weather_key)
            .countries_url(self.countries_url)
            .credentials(Credentials {
                username: self.username,
                password: self.password,
            }))
    }

    pub fn log_path(&self) -> Result<Option<PathBuf>, TwError> {
        self.log_file.as_deref().map(expand_path).transpose()
    }
}

/// Expand `~` and environment variables.
pub fn expand_path(raw: &str) -> Result<PathBuf, TwError> {
    shellexpand::full(raw)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TwError::InvalidConfig(format!("{raw}: {e}")))
}
