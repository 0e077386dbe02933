#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("reqwest error: {0:?}")]
    Reqwest(#[from] reqwest::Error),

    #[error("{path}: upstream responded with {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("pronunciation row has no play control")]
    PlayControlMissing,

    #[error("no extraction strategy could decode play arguments: {0}")]
    UndecodableUrl(String),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}

impl ScrapeError {
    /// True for failures caused by the remote site or the network rather than by us.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ScrapeError::Reqwest(_) | ScrapeError::Status { .. })
    }
}
