use serde::Deserialize;
use tracing::{info, warn};

use crate::inputter::Inputter;
use crate::remote::{FailureKind, Fetch, RequestTracker, is_success_status};

pub const FETCH_FAILED: &str = "Failed to fetch weather data";

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub temperature_c: f64,
    pub humidity: u8,
    pub condition: String,
    pub wind_kph: f64,
}

#[derive(Deserialize)]
struct WeatherBody {
    current: Option<Current>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Current {
    temp_c: f64,
    humidity: u8,
    wind_kph: f64,
    condition: Condition,
}

#[derive(Deserialize)]
struct Condition {
    text: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

pub fn parse_weather(status: u16, body: &str) -> Fetch<WeatherSnapshot> {
    let parsed = serde_json::from_str::<WeatherBody>(body);

    if !is_success_status(status) {
        let message = parsed
            .ok()
            .and_then(|b| b.error)
            .map(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Fetch::failure(FailureKind::Status(status), message);
    }

    match parsed {
        Ok(WeatherBody {
            error: Some(e), ..
        }) => Fetch::failure(FailureKind::Service, e.message),
        Ok(WeatherBody {
            current: Some(c), ..
        }) => Fetch::Success {
            payload: WeatherSnapshot {
                temperature_c: c.temp_c,
                humidity: c.humidity,
                condition: c.condition.text,
                wind_kph: c.wind_kph,
            },
        },
        Ok(_) => Fetch::failure(FailureKind::Malformed, "response has no current conditions"),
        Err(e) => Fetch::failure(FailureKind::Malformed, e.to_string()),
    }
}

/// City lookup with a single displayed snapshot.
#[derive(Debug, Default)]
pub struct WeatherWidget {
    pub input: Inputter,
    snapshot: Option<WeatherSnapshot>,
    requests: RequestTracker,
    last_city: Option<String>,
}

impl WeatherWidget {
    /// Start a lookup for the current input. Returns the request sequence
    /// number and city, or None for a blank city.
    pub fn search(&mut self) -> Option<(u64, String)> {
        let city = self.input.value().trim().to_string();
        if city.is_empty() {
            return None;
        }
        let seq = self.requests.issue();
        self.last_city = Some(city.clone());
        Some((seq, city))
    }

    /// Apply a finished request. None for a stale response that changed
    /// nothing, otherwise Ok or the failure notice to show.
    pub fn finish(
        &mut self,
        seq: u64,
        result: Fetch<WeatherSnapshot>,
    ) -> Option<Result<(), &'static str>> {
        if !self.requests.settle(seq) {
            return None;
        }
        match result {
            Fetch::Success { payload } => {
                info!("Weather for {:?}: {}", self.last_city, payload.condition);
                self.snapshot = Some(payload);
                Some(Ok(()))
            }
            Fetch::Failure { kind, message } => {
                warn!("Weather lookup failed ({kind:?}): {message}");
                Some(Err(FETCH_FAILED))
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.requests.is_pending()
    }

    /// The snapshot to render; hidden while a request is in flight.
    pub fn visible_snapshot(&self) -> Option<&WeatherSnapshot> {
        if self.is_loading() {
            None
        } else {
            self.snapshot.as_ref()
        }
    }

    pub fn last_city(&self) -> Option<&str> {
        self.last_city.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{
        "location": {"name": "Paris"},
        "current": {
            "temp_c": 18.0,
            "humidity": 63,
            "wind_kph": 11.2,
            "condition": {"text": "Partly cloudy", "code": 1003}
        }
    }"#;

    fn snapshot(condition: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature_c: 1.0,
            humidity: 2,
            condition: condition.to_string(),
            wind_kph: 3.0,
        }
    }

    #[test]
    fn parses_current_conditions() {
        match parse_weather(200, OK_BODY) {
            Fetch::Success { payload } => {
                assert_eq!(payload.temperature_c, 18.0);
                assert_eq!(payload.humidity, 63);
                assert_eq!(payload.condition, "Partly cloudy");
                assert_eq!(payload.wind_kph, 11.2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn embedded_error_is_a_service_failure() {
        let body = r#"{"error": {"code": 1006, "message": "No matching location found."}}"#;
        assert_eq!(
            parse_weather(200, body),
            Fetch::failure(FailureKind::Service, "No matching location found.")
        );
        assert_eq!(
            parse_weather(400, body),
            Fetch::failure(FailureKind::Status(400), "No matching location found.")
        );
    }

    #[test]
    fn bad_status_and_bad_bodies() {
        assert_eq!(
            parse_weather(503, "<html>down</html>"),
            Fetch::failure(FailureKind::Status(503), "HTTP 503")
        );
        assert!(matches!(
            parse_weather(200, "not json"),
            Fetch::Failure {
                kind: FailureKind::Malformed,
                ..
            }
        ));
        assert!(matches!(
            parse_weather(200, "{}"),
            Fetch::Failure {
                kind: FailureKind::Malformed,
                ..
            }
        ));
    }

    #[test]
    fn blank_city_does_not_search() {
        let mut widget = WeatherWidget::default();
        widget.input.set("   ");
        assert_eq!(widget.search(), None);
        assert!(!widget.is_loading());
    }

    #[test]
    fn loading_hides_the_old_snapshot() {
        let mut widget = WeatherWidget::default();
        widget.input.set("Paris");
        let (seq, city) = widget.search().unwrap();
        assert_eq!(city, "Paris");
        widget.finish(seq, Fetch::Success { payload: snapshot("Sunny") });
        assert_eq!(widget.visible_snapshot().map(|s| s.condition.as_str()), Some("Sunny"));

        widget.search();
        assert!(widget.is_loading());
        assert!(widget.visible_snapshot().is_none());
    }

    #[test]
    fn failure_keeps_previous_snapshot() {
        let mut widget = WeatherWidget::default();
        widget.input.set("Paris");
        let (seq, _) = widget.search().unwrap();
        widget.finish(seq, Fetch::Success { payload: snapshot("Sunny") });

        let (seq, _) = widget.search().unwrap();
        let applied = widget.finish(seq, Fetch::failure(FailureKind::Network, "refused"));
        assert_eq!(applied, Some(Err(FETCH_FAILED)));
        assert_eq!(widget.visible_snapshot().map(|s| s.condition.as_str()), Some("Sunny"));
    }

    #[test]
    fn late_response_is_ignored() {
        let mut widget = WeatherWidget::default();
        widget.input.set("Paris");
        let (slow, _) = widget.search().unwrap();
        widget.input.set("Rome");
        let (fast, _) = widget.search().unwrap();

        let applied = widget.finish(fast, Fetch::Success { payload: snapshot("Rome sun") });
        assert_eq!(applied, Some(Ok(())));
        let applied = widget.finish(slow, Fetch::failure(FailureKind::Network, "late"));
        assert_eq!(applied, None);
        let applied = widget.finish(slow, Fetch::Success { payload: snapshot("Paris rain") });
        assert_eq!(applied, None);
        assert_eq!(
            widget.visible_snapshot().map(|s| s.condition.as_str()),
            Some("Rome sun")
        );
    }
}
