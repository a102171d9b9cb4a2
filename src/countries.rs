use serde::Deserialize;
use tracing::{error, info};

use crate::inputter::Inputter;
use crate::remote::{FailureKind, Fetch, RequestTracker, is_success_status};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    pub flag: String,
}

pub fn parse_countries(status: u16, body: &str) -> Fetch<Vec<CountryRecord>> {
    if !is_success_status(status) {
        return Fetch::failure(FailureKind::Status(status), format!("HTTP {status}"));
    }
    match serde_json::from_str::<Vec<CountryRecord>>(body) {
        Ok(payload) => Fetch::Success { payload },
        Err(e) => {
            // An error object instead of the list
            if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(body)
                && let Some(err) = obj.get("error")
            {
                return Fetch::failure(FailureKind::Service, err.to_string());
            }
            Fetch::failure(FailureKind::Malformed, e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Country list fetched once, searched by exact name.
#[derive(Debug)]
pub struct CountryGrid {
    pub input: Inputter,
    countries: Vec<CountryRecord>,
    requests: RequestTracker,
    state: LoadState,
}

impl Default for CountryGrid {
    fn default() -> Self {
        Self {
            input: Inputter::default(),
            countries: Vec::new(),
            requests: RequestTracker::default(),
            state: LoadState::NotLoaded,
        }
    }
}

impl CountryGrid {
    /// Request sequence for the load, None while loading or once loaded.
    /// A failed load may be issued again.
    pub fn mount(&mut self) -> Option<u64> {
        if matches!(self.state, LoadState::Loading | LoadState::Loaded) {
            return None;
        }
        self.state = LoadState::Loading;
        Some(self.requests.issue())
    }

    /// Apply the fetched list. Returns an error notice on failure.
    pub fn finish(&mut self, seq: u64, result: Fetch<Vec<CountryRecord>>) -> Option<String> {
        if !self.requests.settle(seq) {
            return None;
        }
        match result {
            Fetch::Success { payload } => {
                info!("Loaded {} countries", payload.len());
                self.countries = payload;
                self.state = LoadState::Loaded;
                None
            }
            Fetch::Failure { kind, message } => {
                error!("Error fetching data ({kind:?}): {message}");
                self.state = LoadState::Failed;
                Some(format!("Error fetching countries: {message}"))
            }
        }
    }

    /// Everything for an empty search, otherwise exact case-insensitive
    /// name matches only.
    pub fn visible(&self) -> Vec<&CountryRecord> {
        let query = self.input.value().trim().to_lowercase();
        if query.is_empty() {
            return self.countries.iter().collect();
        }
        self.countries
            .iter()
            .filter(|c| c.name.to_lowercase() == query)
            .collect()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn count(&self) -> usize {
        self.countries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(names: &[&str]) -> CountryGrid {
        let mut grid = CountryGrid::default();
        let seq = grid.mount().unwrap();
        let payload = names
            .iter()
            .map(|n| CountryRecord {
                name: n.to_string(),
                flag: format!("https://flags/{n}.png"),
            })
            .collect();
        grid.finish(seq, Fetch::Success { payload });
        grid
    }

    #[test]
    fn exact_match_not_substring() {
        let mut grid = loaded(&["France", "francesca", "Germany"]);
        grid.input.set("France");
        let names: Vec<&str> = grid.visible().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["France"]);

        grid.input.set("FRANCE ");
        assert_eq!(grid.visible().len(), 1);

        grid.input.set("fran");
        assert!(grid.visible().is_empty());
    }

    #[test]
    fn empty_search_shows_everything() {
        let grid = loaded(&["France", "francesca", "Germany"]);
        assert_eq!(grid.visible().len(), 3);
    }

    #[test]
    fn fetched_only_once() {
        let mut grid = CountryGrid::default();
        assert!(grid.mount().is_some());
        assert_eq!(grid.state(), LoadState::Loading);
        assert!(grid.mount().is_none());
    }

    #[test]
    fn failure_leaves_list_empty() {
        let mut grid = CountryGrid::default();
        let seq = grid.mount().unwrap();
        let notice = grid.finish(seq, Fetch::failure(FailureKind::Network, "refused"));
        assert!(notice.unwrap().contains("refused"));
        assert_eq!(grid.state(), LoadState::Failed);
        assert_eq!(grid.count(), 0);
        assert!(grid.visible().is_empty());
    }

    #[test]
    fn failed_load_can_be_retried() {
        let mut grid = CountryGrid::default();
        let first = grid.mount().unwrap();
        grid.finish(first, Fetch::failure(FailureKind::Network, "refused"));

        let retry = grid.mount().expect("retry after failure");
        assert_ne!(retry, first);
        assert_eq!(grid.state(), LoadState::Loading);
        let payload = vec![CountryRecord {
            name: "Peru".to_string(),
            flag: "pe.png".to_string(),
        }];
        assert_eq!(grid.finish(retry, Fetch::Success { payload }), None);
        assert_eq!(grid.state(), LoadState::Loaded);
        assert_eq!(grid.count(), 1);
        assert!(grid.mount().is_none());
    }

    #[test]
    fn parses_list_and_ignores_extra_fields() {
        let body = r#"[{"name": "France", "flag": "fr.png", "abbr": "FR"}]"#;
        assert_eq!(
            parse_countries(200, body),
            Fetch::Success {
                payload: vec![CountryRecord {
                    name: "France".to_string(),
                    flag: "fr.png".to_string(),
                }]
            }
        );
    }

    #[test]
    fn classifies_failures() {
        assert_eq!(
            parse_countries(500, "[]"),
            Fetch::failure(FailureKind::Status(500), "HTTP 500")
        );
        assert!(matches!(
            parse_countries(200, r#"{"error": "quota"}"#),
            Fetch::Failure {
                kind: FailureKind::Service,
                ..
            }
        ));
        assert!(matches!(
            parse_countries(200, r#"[{"name": "x"}]"#),
            Fetch::Failure {
                kind: FailureKind::Malformed,
                ..
            }
        ));
    }
}
