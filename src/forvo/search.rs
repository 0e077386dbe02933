//! Search page scraping. The search page lists fuzzy matches without any
//! speaker information, so every result gets the same label.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::config::Config;
use crate::errors::ScrapeError;
use crate::forvo::{
    play_url,
    session::PageFetcher,
    types::{AudioSource, SEARCH_SOURCE_NAME},
};

static PLAY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("ul.word-play-list-icon-size-l>li>div.play")
        .expect("Failed to parse search play selector")
});

pub fn parse_search_page(html: &str, audio_host: &str) -> Result<Vec<AudioSource>, ScrapeError> {
    let document = Html::parse_document(html);

    document
        .select(&PLAY_SELECTOR)
        .map(|play| -> Result<AudioSource, ScrapeError> {
            let onclick = play.attr("onclick").ok_or(ScrapeError::PlayControlMissing)?;
            Ok(AudioSource {
                name: SEARCH_SOURCE_NAME.to_string(),
                url: play_url::extract_url(onclick, audio_host)?,
            })
        })
        .collect()
}

pub fn search_path(term: &str, language: &str) -> String {
    format!(
        "/search/{}/{}/",
        super::encode_segment(term),
        super::encode_segment(language)
    )
}

pub fn search_word(
    fetcher: &dyn PageFetcher,
    term: &str,
    config: &Config,
) -> Result<Vec<AudioSource>, ScrapeError> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(vec![]);
    }

    let html = fetcher.fetch(&search_path(term, &config.language))?;
    parse_search_page(&html, &config.audio_host)
}
