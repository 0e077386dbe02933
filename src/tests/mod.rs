
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::errors::ScrapeError;
use crate::forvo::{search, word, Forvo, PageFetcher};

pub const WORD_SUGOI: &str = include_str!("fixtures/word_sugoi.html");
pub const WORD_MIXED: &str = include_str!("fixtures/word_mixed.html");
pub const SEARCH_SUGOI: &str = include_str!("fixtures/search_sugoi.html");

pub const AUDIO_HOST: &str = "https://audio12.forvo.com";

/// Serves canned pages and records every requested path.
/// Unknown paths get a page without results.
#[derive(Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word(mut self, term: &str, html: &str) -> Self {
        self.pages.insert(word::word_path(term), html.to_string());
        self
    }

    pub fn search(mut self, term: &str, language: &str, html: &str) -> Self {
        self.pages
            .insert(search::search_path(term, language), html.to_string());
        self
    }

    pub fn failing_word(mut self, term: &str) -> Self {
        self.failing.insert(word::word_path(term));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl PageFetcher for FixtureFetcher {
    fn fetch(&self, path: &str) -> Result<String, ScrapeError> {
        self.calls.lock().unwrap().push(path.to_string());

        if self.failing.contains(path) {
            return Err(ScrapeError::Status {
                path: path.to_string(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }

        Ok(self
            .pages
            .get(path)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }
}

pub fn create_forvo(fetcher: FixtureFetcher) -> (Forvo, Arc<FixtureFetcher>) {
    let fetcher = Arc::new(fetcher);
    (Forvo::new(fetcher.clone()), fetcher)
}

pub fn test_config() -> Config {
    Config {
        audio_host: AUDIO_HOST.to_string(),
        ..Default::default()
    }
}
