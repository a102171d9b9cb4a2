use std::collections::BTreeMap;

use tracing::trace;

use crate::inputter::Inputter;

/// Looks up free text against a fixed misspelling -> correction table.
#[derive(Debug, Clone)]
pub struct SpellChecker {
    dictionary: BTreeMap<String, String>,
    pub input: Inputter,
    suggestion: Option<(String, String)>,
}

impl SpellChecker {
    pub fn new(dictionary: BTreeMap<String, String>) -> Self {
        let dictionary = dictionary
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Self {
            dictionary,
            input: Inputter::default(),
            suggestion: None,
        }
    }

    /// First token (left to right, lowercased) with a known correction.
    /// Returns the matched token together with its correction.
    pub fn suggest(&self, text: &str) -> Option<(String, String)> {
        text.split_whitespace()
            .map(str::to_lowercase)
            .find_map(|token| {
                self.dictionary
                    .get(&token)
                    .map(|correction| (token.clone(), correction.clone()))
            })
    }

    /// Recompute the suggestion for the current input text.
    pub fn refresh(&mut self) {
        self.suggestion = self.suggest(self.input.value());
        trace!("Spell suggestion: {:?}", self.suggestion);
    }

    pub fn suggestion(&self) -> Option<&(String, String)> {
        self.suggestion.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TwConfig;

    fn checker() -> SpellChecker {
        SpellChecker::new(TwConfig::default().dictionary)
    }

    #[test]
    fn first_match_wins() {
        let suggestion = checker().suggest("I wrok hard fot exampl");
        assert_eq!(suggestion, Some(("wrok".to_string(), "work".to_string())));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let suggestion = checker().suggest("  TEH  end ");
        assert_eq!(suggestion, Some(("teh".to_string(), "the".to_string())));
    }

    #[test]
    fn blank_or_clean_text_has_no_suggestion() {
        let checker = checker();
        assert_eq!(checker.suggest(""), None);
        assert_eq!(checker.suggest(" \t\n "), None);
        assert_eq!(checker.suggest("all words fine"), None);
    }

    #[test]
    fn punctuation_is_part_of_the_token() {
        assert_eq!(checker().suggest("wrok."), None);
    }

    #[test]
    fn refresh_tracks_the_input() {
        let mut checker = checker();
        checker.input.set("fot you");
        checker.refresh();
        assert_eq!(checker.suggestion().map(|s| s.1.as_str()), Some("for"));
        checker.input.set("fine");
        checker.refresh();
        assert!(checker.suggestion().is_none());
    }
}
