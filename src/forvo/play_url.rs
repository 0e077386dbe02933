//! Audio URL reconstruction from the site's `Play(...)` onclick handler.
//!
//! A play control looks like
//! `Play(3060224,'OTQyN...','OTQyN..',false,'Yy9wL2Nw...','Yy9wL...','h')`.
//! Splitting on quotes, commas and parentheses gives `["Play", "3060224", ...]`,
//! where some positions hold base64 encoded file paths.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ScrapeError;

/// Accepts missing or extra padding and non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static PLAY_ARG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^',()]+").expect("Failed to compile play argument regex"));

/// Where on the audio host a decoded path lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Normalized recordings under `/audios/mp3/`
    Normalized,
    /// Raw uploads under `/mp3/`
    Raw,
}

/// Tried in order, the first one that decodes wins.
pub const STRATEGIES: [ExtractionStrategy; 2] =
    [ExtractionStrategy::Normalized, ExtractionStrategy::Raw];

impl ExtractionStrategy {
    pub fn arg_index(&self) -> usize {
        match self {
            ExtractionStrategy::Normalized => 5,
            ExtractionStrategy::Raw => 2,
        }
    }

    pub fn location(&self) -> &'static str {
        match self {
            ExtractionStrategy::Normalized => "audios/mp3",
            ExtractionStrategy::Raw => "mp3",
        }
    }

    /// Decoded file path, or `None` if the argument is missing, empty or not
    /// base64 utf8. Characters outside the base64 alphabet are skipped.
    pub fn decode(&self, args: &[&str]) -> Option<String> {
        let arg = args.get(self.arg_index())?;
        let cleaned: String = arg
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/'))
            .collect();
        let bytes = LENIENT.decode(cleaned).ok()?;
        String::from_utf8(bytes).ok().filter(|path| !path.is_empty())
    }
}

/// Permissive tokenizer, does not require valid javascript.
pub fn play_args(raw: &str) -> Vec<&str> {
    PLAY_ARG_REGEX.find_iter(raw).map(|m| m.as_str()).collect()
}

pub fn extract_url(raw: &str, audio_host: &str) -> Result<String, ScrapeError> {
    let args = play_args(raw);

    for strategy in STRATEGIES {
        match strategy.decode(&args) {
            Some(file) => {
                return Ok(format!("{audio_host}/{}/{file}", strategy.location()));
            }
            None => log::debug!("{strategy:?} extraction failed for {raw:?}"),
        }
    }

    Err(ScrapeError::UndecodableUrl(raw.to_string()))
}
