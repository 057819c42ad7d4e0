use serde::Deserialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::directions::check_status;
use crate::error::Result;
use crate::http::{self, HttpClient};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum AddressField {
    Start,
    Destination,
}

/// Place search: partial text to ranked display strings.
pub trait PlaceAutocomplete: Send + Sync {
    fn find_autocomplete_predictions(&self, query: &str) -> Result<Vec<String>>;
}

/// The dropdown contents for one text field.
#[derive(Default, Debug)]
pub struct SuggestionList {
    latest_query: Option<String>,
    suggestions: Vec<String>,
}

impl SuggestionList {
    /// Returns the query to send, if any. Empty text sends nothing and keeps
    /// the current suggestions.
    pub fn on_text_changed(&mut self, text: &str) -> Option<String> {
        if text.is_empty() {
            self.latest_query = None;
            return None;
        }
        self.latest_query = Some(text.to_string());
        Some(text.to_string())
    }

    /// A successful response for the latest query replaces the list. Late
    /// responses and failures leave it untouched.
    pub fn apply(&mut self, query: &str, result: Result<Vec<String>>) -> bool {
        if self.latest_query.as_deref() != Some(query) {
            debug!("[autocomplete] dropping stale suggestions for {:?}", query);
            return false;
        }
        match result {
            Ok(suggestions) => {
                self.suggestions = suggestions;
                true
            }
            Err(e) => {
                warn!("[autocomplete] lookup for {:?} failed: {}", query, e);
                false
            }
        }
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }
}

#[derive(Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
struct Prediction {
    description: String,
}

pub fn parse_autocomplete_response(body: &str) -> Result<Vec<String>> {
    let response: AutocompleteResponse = serde_json::from_str(body)?;
    check_status(response.status.as_deref(), response.error_message.as_deref())?;
    Ok(response
        .predictions
        .into_iter()
        .map(|p| p.description)
        .collect())
}

pub struct HttpPlaceAutocomplete {
    http: Arc<HttpClient>,
    base_url: String,
    api_key: String,
}

impl HttpPlaceAutocomplete {
    pub fn new(config: &AppConfig, http: Arc<HttpClient>) -> Self {
        HttpPlaceAutocomplete {
            http,
            base_url: config.maps_base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

impl PlaceAutocomplete for HttpPlaceAutocomplete {
    fn find_autocomplete_predictions(&self, query: &str) -> Result<Vec<String>> {
        let url = http::build_url(
            &self.base_url,
            "place/autocomplete/json",
            &[("input", query), ("key", &self.api_key)],
        )?;
        let body = self.http.get_text(&url)?;
        parse_autocomplete_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;

    #[test]
    fn empty_text_sends_nothing() {
        let mut list = SuggestionList::default();
        assert_eq!(list.on_text_changed(""), None);
        assert_eq!(list.on_text_changed("Pudong"), Some("Pudong".to_string()));
    }

    #[test]
    fn only_latest_query_applies() {
        let mut list = SuggestionList::default();
        list.on_text_changed("Pu");
        list.on_text_changed("Pud");
        assert!(!list.apply("Pu", Ok(vec!["Putuo".to_string()])));
        assert!(list.suggestions().is_empty());
        assert!(list.apply("Pud", Ok(vec!["Pudong Airport".to_string()])));
        assert_eq!(list.suggestions(), ["Pudong Airport".to_string()]);

        // failures keep what we had
        list.on_text_changed("Pudo");
        assert!(!list.apply("Pudo", Err(RouteError::Other("offline".to_string()))));
        assert_eq!(list.suggestions().len(), 1);
    }

    #[test]
    fn parse_predictions() {
        let body = r#"{
            "predictions": [
                { "description": "Pudong Airport, Shanghai, China", "place_id": "a" },
                { "description": "Pudong Avenue, Shanghai, China", "place_id": "b" }
            ],
            "status": "OK"
        }"#;
        assert_eq!(
            parse_autocomplete_response(body).unwrap(),
            vec![
                "Pudong Airport, Shanghai, China".to_string(),
                "Pudong Avenue, Shanghai, China".to_string()
            ]
        );
    }
}
