use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, error, trace, warn};

use crate::countries::{CountryRecord, parse_countries};
use crate::domain::{Message, TwConfig, TwError};
use crate::weather::{WeatherSnapshot, parse_weather};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, DNS, timeout or body read failure.
    Network,
    /// The server answered with a non-success status.
    Status(u16),
    /// The body was not the JSON shape we expect.
    Malformed,
    /// The service reported an error inside a successful response.
    Service,
}

/// Outcome of one remote request.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Success { payload: T },
    Failure { kind: FailureKind, message: String },
}

impl<T> Fetch<T> {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Fetch::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Fetch::Success { .. })
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

pub trait RemoteSource: Send + Sync {
    fn weather(&self, city: &str) -> Fetch<WeatherSnapshot>;
    fn countries(&self) -> Fetch<Vec<CountryRecord>>;
}

pub struct HttpSource {
    client: Client,
    weather_url: String,
    weather_key: String,
    countries_url: String,
}

impl HttpSource {
    pub fn new(config: &TwConfig) -> Result<Self, TwError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            weather_url: config.weather_url.clone(),
            weather_key: config.weather_key.clone(),
            countries_url: config.countries_url.clone(),
        })
    }

    fn get(&self, url: Url) -> Result<(u16, String), reqwest::Error> {
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok((status, body))
    }
}

impl RemoteSource for HttpSource {
    fn weather(&self, city: &str) -> Fetch<WeatherSnapshot> {
        let url = match Url::parse_with_params(
            &self.weather_url,
            &[("key", self.weather_key.as_str()), ("q", city)],
        ) {
            Ok(url) => url,
            Err(e) => return Fetch::failure(FailureKind::Network, format!("bad url: {e}")),
        };
        debug!("GET weather for {city:?}");
        match self.get(url) {
            Ok((status, body)) => parse_weather(status, &body),
            Err(e) => Fetch::failure(FailureKind::Network, e.to_string()),
        }
    }

    fn countries(&self) -> Fetch<Vec<CountryRecord>> {
        let url = match Url::parse(&self.countries_url) {
            Ok(url) => url,
            Err(e) => return Fetch::failure(FailureKind::Network, format!("bad url: {e}")),
        };
        debug!("GET countries");
        match self.get(url) {
            Ok((status, body)) => parse_countries(status, &body),
            Err(e) => Fetch::failure(FailureKind::Network, e.to_string()),
        }
    }
}

/// Runs each request on its own worker thread and posts the result back
/// to the UI loop as a `Message`.
#[derive(Clone)]
pub struct Dispatcher {
    source: Arc<dyn RemoteSource>,
    tx: Sender<Message>,
}

impl Dispatcher {
    pub fn new(source: Arc<dyn RemoteSource>, tx: Sender<Message>) -> Self {
        Self { source, tx }
    }

    pub fn weather(&self, seq: u64, city: String) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.spawn("weather", move || {
            let result = source.weather(&city);
            if tx.send(Message::WeatherLoaded(seq, result)).is_err() {
                warn!("Weather result #{seq} dropped, receiver gone");
            }
        });
    }

    pub fn countries(&self, seq: u64) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.spawn("countries", move || {
            let result = source.countries();
            if tx.send(Message::CountriesLoaded(seq, result)).is_err() {
                warn!("Countries result #{seq} dropped, receiver gone");
            }
        });
    }

    fn spawn(&self, name: &str, job: impl FnOnce() + Send + 'static) {
        trace!("Spawning {name} request");
        if let Err(e) = thread::Builder::new()
            .name(format!("tw-{name}"))
            .spawn(job)
        {
            error!("Could not spawn {name} request: {e}");
        }
    }
}

/// Sequence numbers for the requests of one widget. Only the most recent
/// request may update the widget; anything older is stale.
#[derive(Debug, Default)]
pub struct RequestTracker {
    issued: u64,
    pending: Option<u64>,
}

impl RequestTracker {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.pending = Some(self.issued);
        self.issued
    }

    /// True if `seq` is the request we are waiting for.
    pub fn settle(&mut self, seq: u64) -> bool {
        if self.pending == Some(seq) {
            self.pending = None;
            true
        } else {
            debug!("Ignoring stale response #{seq} (pending {:?})", self.pending);
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
