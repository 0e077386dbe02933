use std::sync::Arc;

use crate::config::Config;
use crate::errors::ScrapeError;
use crate::forvo::{
    search,
    session::PageFetcher,
    types::{AudioSource, DebugReport},
    word,
};

/// Cascade stages, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStage {
    WordTerm,
    WordReading,
    SearchTerm,
    SearchReading,
}

pub const CASCADE: [LookupStage; 4] = [
    LookupStage::WordTerm,
    LookupStage::WordReading,
    LookupStage::SearchTerm,
    LookupStage::SearchReading,
];

impl LookupStage {
    pub fn name(&self) -> &'static str {
        match self {
            LookupStage::WordTerm => "word.term",
            LookupStage::WordReading => "word.reading",
            LookupStage::SearchTerm => "search.term",
            LookupStage::SearchReading => "search.reading",
        }
    }
}

/// Pronunciation scraper. Holds no per-request state: every call receives the
/// config snapshot it should run under.
#[derive(Clone)]
pub struct Forvo {
    fetcher: Arc<dyn PageFetcher>,
}

impl Forvo {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn word(&self, term: &str, config: &Config) -> Result<Vec<AudioSource>, ScrapeError> {
        word::lookup_word(self.fetcher.as_ref(), term, config)
    }

    pub fn search(&self, term: &str, config: &Config) -> Result<Vec<AudioSource>, ScrapeError> {
        search::search_word(self.fetcher.as_ref(), term, config)
    }

    pub fn stage(
        &self,
        stage: LookupStage,
        term: &str,
        reading: &str,
        config: &Config,
    ) -> Result<Vec<AudioSource>, ScrapeError> {
        match stage {
            LookupStage::WordTerm => self.word(term, config),
            LookupStage::WordReading => self.word(reading, config),
            LookupStage::SearchTerm => self.search(term, config),
            LookupStage::SearchReading => self.search(reading, config),
        }
    }

    /// First non-empty stage wins. Errors are not caught, a failing stage
    /// fails the whole lookup.
    pub fn resolve(
        &self,
        term: &str,
        reading: &str,
        config: &Config,
    ) -> Result<Vec<AudioSource>, ScrapeError> {
        for stage in CASCADE {
            let sources = self.stage(stage, term, reading, config)?;
            log::debug!("{}: {} sources", stage.name(), sources.len());

            if !sources.is_empty() {
                return Ok(sources);
            }
        }

        Ok(vec![])
    }

    pub fn debug_report(
        &self,
        term: &str,
        reading: &str,
        config: &Config,
    ) -> Result<DebugReport, ScrapeError> {
        Ok(DebugReport {
            debug: true,
            term: term.to_string(),
            reading: reading.to_string(),
            language: config.language.clone(),
            word_term: self.stage(LookupStage::WordTerm, term, reading, config)?,
            word_reading: self.stage(LookupStage::WordReading, term, reading, config)?,
            search_term: self.stage(LookupStage::SearchTerm, term, reading, config)?,
            search_reading: self.stage(LookupStage::SearchReading, term, reading, config)?,
        })
    }
}
