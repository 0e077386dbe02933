use serde::{Deserialize, Serialize};

pub const SEARCH_SOURCE_NAME: &str = "Forvo Search";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn symbol(&self) -> &'static str {
        match self {
            Gender::Male => "♂",
            Gender::Female => "♀",
        }
    }
}

/// One scraped row of a word page. Lives only until it is ranked and rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct PronunciationRecord {
    pub username: String,
    pub url: String,
    pub gender: Option<Gender>,
    /// Country as printed on the page, original casing
    pub country: Option<String>,
}

impl PronunciationRecord {
    /// `Forvo (♂skent, Japan)`
    pub fn display_name(&self) -> String {
        let symbol = self.gender.as_ref().map(Gender::symbol).unwrap_or_default();
        match &self.country {
            Some(country) => format!("Forvo ({symbol}{}, {country})", self.username),
            None => format!("Forvo ({symbol}{})", self.username),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    pub name: String,
    pub url: String,
}

impl From<PronunciationRecord> for AudioSource {
    fn from(record: PronunciationRecord) -> Self {
        AudioSource {
            name: record.display_name(),
            url: record.url,
        }
    }
}

/// Response body understood by the dictionary client's custom audio source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "audioSourceList", rename_all = "camelCase")]
pub struct AudioSourceList {
    pub audio_sources: Vec<AudioSource>,
}

impl From<Vec<AudioSource>> for AudioSourceList {
    fn from(audio_sources: Vec<AudioSource>) -> Self {
        AudioSourceList { audio_sources }
    }
}

/// Every cascade stage, evaluated independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugReport {
    pub debug: bool,
    pub term: String,
    pub reading: String,
    pub language: String,
    #[serde(rename = "word.term")]
    pub word_term: Vec<AudioSource>,
    #[serde(rename = "word.reading")]
    pub word_reading: Vec<AudioSource>,
    #[serde(rename = "search.term")]
    pub search_term: Vec<AudioSource>,
    #[serde(rename = "search.reading")]
    pub search_reading: Vec<AudioSource>,
}
