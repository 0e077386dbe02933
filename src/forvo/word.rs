//! Word page scraping.
//!
//! A word page groups pronunciations by language:
//!
//! ```html
//! <div id="language-container-ja">
//!   <article>
//!     <ul class="pronunciations-list">
//!       <li>
//!         <div class="play" onclick="Play(...)"></div>
//!         Pronunciation by <span><a href="/user/skent">skent</a></span>
//!         <span class="from">(Male from Japan)</span>
//!       </li>
//!       <li class="li-ad">...</li>
//!     </ul>
//!   </article>
//! </div>
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::Config;
use crate::errors::ScrapeError;
use crate::forvo::{
    play_url,
    ranking,
    session::PageFetcher,
    types::{AudioSource, Gender, PronunciationRecord},
};

pub const UNKNOWN_USERNAME: &str = "Unknown";

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Pronunciation by([^(]+)\(").expect("Failed to compile username regex")
});

static GENDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((Male|Female)").expect("Failed to compile gender regex"));

static COUNTRY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((?:Male|Female) from ([^)]+)\)").expect("Failed to compile country regex")
});

static PLAY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div").expect("Failed to parse play selector"));

fn rows_selector(language: &str) -> Result<Selector, ScrapeError> {
    let selector = format!(
        "#language-container-{language}>article>ul.pronunciations-list>li:not(.li-ad)"
    );
    Selector::parse(&selector)
        .map_err(|err| anyhow::anyhow!("invalid language {language:?}: {err:?}").into())
}

/// Visible text with every text node trimmed and joined without separators,
/// e.g. `Pronunciation byskent(Male from Japan)`.
pub fn row_text(row: &ElementRef) -> String {
    row.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn parse_username(text: &str) -> Option<String> {
    USERNAME_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|u| !u.is_empty())
}

pub fn parse_gender(text: &str) -> Option<Gender> {
    GENDER_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| match m.as_str() {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            _ => None,
        })
}

pub fn parse_country(text: &str) -> Option<String> {
    COUNTRY_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|c| !c.is_empty())
}

fn parse_row(row: &ElementRef, config: &Config) -> Result<PronunciationRecord, ScrapeError> {
    let onclick = row
        .select(&PLAY_SELECTOR)
        .next()
        .and_then(|play| play.attr("onclick"))
        .ok_or(ScrapeError::PlayControlMissing)?;
    let url = play_url::extract_url(onclick, &config.audio_host)?;

    let text = row_text(row);

    // deleted accounts have no profile link, so read the name from the text
    let username = parse_username(&text).unwrap_or_else(|| {
        log::debug!("no username in {text:?}");
        UNKNOWN_USERNAME.to_string()
    });

    let gender = if config.show_gender {
        parse_gender(&text)
    } else {
        None
    };

    let country = if config.show_country || !config.preferred_countries.is_empty() {
        parse_country(&text)
    } else {
        None
    };

    Ok(PronunciationRecord {
        username,
        url,
        gender,
        country,
    })
}

/// Records in document order, advertisement rows excluded.
pub fn parse_word_page(html: &str, config: &Config) -> Result<Vec<PronunciationRecord>, ScrapeError> {
    let document = Html::parse_document(html);
    let selector = rows_selector(&config.language)?;

    document
        .select(&selector)
        .map(|row| parse_row(&row, config))
        .collect()
}

pub fn word_path(term: &str) -> String {
    format!("/word/{}/", super::encode_segment(term))
}

pub fn lookup_word(
    fetcher: &dyn PageFetcher,
    term: &str,
    config: &Config,
) -> Result<Vec<AudioSource>, ScrapeError> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(vec![]);
    }

    let html = fetcher.fetch(&word_path(term))?;
    let records = parse_word_page(&html, config)?;

    Ok(ranking::rank(records, config)
        .into_iter()
        .map(AudioSource::from)
        .collect())
}
