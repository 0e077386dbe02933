pub mod lookup;
pub mod play_url;
pub mod ranking;
pub mod search;
pub mod session;
pub mod types;
pub mod word;

pub use lookup::Forvo;
pub use session::{PageFetcher, SessionManager};
pub use types::AudioSourceList;

/// Percent-encodes a single path segment, `/` included.
pub(crate) fn encode_segment(segment: &str) -> String {
    let mut url = url::Url::parse("http://localhost/").expect("static url is valid");
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(segment);
    }
    url.path().trim_start_matches('/').to_string()
}
