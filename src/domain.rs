use std::collections::BTreeMap;
use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::countries::CountryRecord;
use crate::form::{Delivery, EmailRule, FormPolicy};
use crate::remote::Fetch;
use crate::weather::WeatherSnapshot;

pub const HELP_TEXT: &str = "\
Global
  Tab / Shift+Tab   next / previous screen
  1 .. 8            jump to screen
  ?                 this help
  q / Ctrl+C        quit
  Esc               close popup, leave input

Table
  d / v             sort by date / by views
  Up Down Home End  move selection
  /                 filter by article, empty clears
  y                 copy row to clipboard

Spell, Weather, Countries
  i or Enter        focus the input (Enter in weather searches)

Modals
  o                 open the form
  Tab / Up / Down   switch field
  Enter             submit, Esc closes

Login
  i or Enter        focus, Tab switches field, Enter submits

Stopwatch
  Space             start / stop
  r                 reset
";

#[derive(Debug)]
pub enum TwError {
    IoError(Error),
    PolarsError(PolarsError),
    HttpError(reqwest::Error),
    JsonError(serde_json::Error),
    ClipboardError(arboard::Error),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    InvalidConfig(String),
}

impl fmt::Display for TwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwError::IoError(e) => write!(f, "io error: {e}"),
            TwError::PolarsError(e) => write!(f, "could not read table: {e}"),
            TwError::HttpError(e) => write!(f, "http error: {e}"),
            TwError::JsonError(e) => write!(f, "json error: {e}"),
            TwError::ClipboardError(e) => write!(f, "clipboard error: {e}"),
            TwError::LoadingFailed(msg) => write!(f, "loading failed: {msg}"),
            TwError::FileNotFound => write!(f, "file not found"),
            TwError::PermissionDenied => write!(f, "permission denied"),
            TwError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for TwError {}

impl From<Error> for TwError {
    fn from(err: Error) -> Self {
        TwError::IoError(err)
    }
}

impl From<PolarsError> for TwError {
    fn from(err: PolarsError) -> Self {
        TwError::PolarsError(err)
    }
}

impl From<reqwest::Error> for TwError {
    fn from(err: reqwest::Error) -> Self {
        TwError::HttpError(err)
    }
}

impl From<serde_json::Error> for TwError {
    fn from(err: serde_json::Error) -> Self {
        TwError::JsonError(err)
    }
}

impl From<arboard::Error> for TwError {
    fn from(err: arboard::Error) -> Self {
        TwError::ClipboardError(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Table,
    Spell,
    AlertModal,
    InlineModal,
    Login,
    Weather,
    Stopwatch,
    Countries,
}

impl Screen {
    pub const ALL: [Screen; 8] = [
        Screen::Table,
        Screen::Spell,
        Screen::AlertModal,
        Screen::InlineModal,
        Screen::Login,
        Screen::Weather,
        Screen::Stopwatch,
        Screen::Countries,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Screen::Table => "Table",
            Screen::Spell => "Spell",
            Screen::AlertModal => "Modal (alert)",
            Screen::InlineModal => "Modal (inline)",
            Screen::Login => "Login",
            Screen::Weather => "Weather",
            Screen::Stopwatch => "Stopwatch",
            Screen::Countries => "Countries",
        }
    }

    pub fn index(self) -> usize {
        Screen::ALL.iter().position(|&s| s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Screen::ALL[(self.index() + 1) % Screen::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Screen::ALL[(self.index() + Screen::ALL.len() - 1) % Screen::ALL.len()]
    }
}

#[derive(Debug)]
pub enum Message {
    Quit,
    Tick,
    Help,
    Exit,
    Enter,
    NextScreen,
    PrevScreen,
    Goto(Screen),
    Resize(usize, usize),
    RawKey(KeyEvent),
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    SortByDate,
    SortByViews,
    Filter,
    CopyRow,
    Focus,
    OpenModal,
    ToggleStopwatch,
    ResetStopwatch,
    WeatherLoaded(u64, Fetch<WeatherSnapshot>),
    CountriesLoaded(u64, Fetch<Vec<CountryRecord>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct TwConfig {
    pub event_poll_time: u64,
    pub records: Option<PathBuf>,
    pub weather_url: String,
    pub weather_key: String,
    pub countries_url: String,
    pub credentials: Credentials,
    pub dictionary: BTreeMap<String, String>,
    pub alert_policy: FormPolicy,
    pub inline_policy: FormPolicy,
}

impl Default for TwConfig {
    fn default() -> Self {
        let dictionary = [
            ("teh", "the"),
            ("wrok", "work"),
            ("fot", "for"),
            ("exampl", "example"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            event_poll_time: 100,
            records: None,
            weather_url: "https://api.weatherapi.com/v1/current.json".to_string(),
            weather_key: String::new(),
            countries_url: "https://xcountries-backend.azurewebsites.net/all".to_string(),
            credentials: Credentials {
                username: "user".to_string(),
                password: "password".to_string(),
            },
            dictionary,
            alert_policy: FormPolicy {
                delivery: Delivery::AlertFirstError,
                email: EmailRule::ContainsAt,
            },
            inline_policy: FormPolicy {
                delivery: Delivery::AccumulateAllErrors,
                email: EmailRule::Strict,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screens_cycle_in_both_directions() {
        assert_eq!(Screen::Table.next(), Screen::Spell);
        assert_eq!(Screen::Table.prev(), Screen::Countries);
        assert_eq!(Screen::Countries.next(), Screen::Table);
        for s in Screen::ALL {
            assert_eq!(s.next().prev(), s);
        }
    }

    #[test]
    fn config_setters_override_defaults() {
        let cfg = TwConfig::default()
            .event_poll_time(10u64)
            .weather_key("secret");
        assert_eq!(cfg.event_poll_time, 10);
        assert_eq!(cfg.weather_key, "secret");
        assert_eq!(cfg.dictionary.get("wrok").map(String::as_str), Some("work"));
    }
}
