use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE},
    StatusCode,
};
use std::{error::Error, sync::RwLock, thread::sleep, time::Duration};

use crate::errors::ScrapeError;

const USER_AGENT_DEFAULT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Safari/537.36 Edg/105.0.1343.27";
const ACCEPT_LANGUAGE_DEFAULT: &str = "en-US,en;q=0.5";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const STATUS_RETRIES: u32 = 3;
const BACKOFF_FACTOR: Duration = Duration::from_secs(1);
const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Source of html pages, addressed by path relative to the site root.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, path: &str) -> Result<String, ScrapeError>;
}

fn get_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => e.to_string(),
            None => e.to_string(),
        },
        None => error.to_string(),
    }
}

fn build_client() -> Result<Client, ScrapeError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_DEFAULT),
    );

    Ok(Client::builder()
        .user_agent(USER_AGENT_DEFAULT)
        .default_headers(headers)
        .cookie_store(true)
        .timeout(REQUEST_TIMEOUT)
        .pool_idle_timeout(Duration::from_secs(10))
        .build()?)
}

fn backoff(factor: Duration, retry: u32) -> Duration {
    factor * 2u32.pow(retry.saturating_sub(1))
}

/// Client plus the number of times it has been rebuilt.
struct SessionState {
    generation: u64,
    client: Client,
}

/// Shared outbound session.
///
/// Transient statuses are retried with exponential backoff on the same client.
/// When that fails too, or on a transport error (timeout, connection, tls), the
/// client is replaced and the request is tried exactly once more; a second
/// failure is returned.
pub struct SessionManager {
    server_host: String,
    backoff_factor: Duration,
    state: RwLock<SessionState>,
}

impl SessionManager {
    pub fn new(server_host: &str) -> Result<Self, ScrapeError> {
        Ok(Self {
            server_host: server_host.trim_end_matches('/').to_string(),
            backoff_factor: BACKOFF_FACTOR,
            state: RwLock::new(SessionState {
                generation: 0,
                client: build_client()?,
            }),
        })
    }

    pub fn with_backoff_factor(mut self, backoff_factor: Duration) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    pub fn generation(&self) -> u64 {
        self.current().0
    }

    fn current(&self) -> (u64, Client) {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        // reqwest clients are reference counted, cloning shares the pool
        (state.generation, state.client.clone())
    }

    /// Replaces the client unless another worker already did so since `seen`.
    fn rebuild(&self, seen: u64) -> Result<(u64, Client), ScrapeError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.generation == seen {
            log::warn!("rebuilding http session (generation {seen})");
            state.client = build_client()?;
            state.generation += 1;
        }
        Ok((state.generation, state.client.clone()))
    }

    fn get_with_status_retries(&self, client: &Client, url: &str) -> reqwest::Result<String> {
        let mut retry = 0;
        loop {
            log::debug!("{url}: requesting");
            let resp = client.get(url).send()?;
            let status = resp.status();

            if RETRY_STATUSES.contains(&status) && retry < STATUS_RETRIES {
                retry += 1;
                let delay = backoff(self.backoff_factor, retry);
                log::warn!("{url}: {status}, retry {retry}/{STATUS_RETRIES} in {delay:?}");
                sleep(delay);
                continue;
            }

            if RETRY_STATUSES.contains(&status) {
                // retries exhausted
                return resp.error_for_status().and_then(|r| r.text());
            }

            if !status.is_success() {
                log::debug!("{url}: {status}");
            }

            return resp.text();
        }
    }
}

impl PageFetcher for SessionManager {
    fn fetch(&self, path: &str) -> Result<String, ScrapeError> {
        let url = format!("{}{path}", self.server_host);
        let (generation, client) = self.current();

        let err = match self.get_with_status_retries(&client, &url) {
            Ok(text) => return Ok(text),
            Err(err) => err,
        };

        log::warn!("{url}: {err}: {:#?}", get_error(&err));
        let (_, client) = self.rebuild(generation)?;

        self.get_with_status_retries(&client, &url).map_err(|err| {
            log::error!("{url}: {err}: {:#?}", get_error(&err));
            if err.is_status() {
                status_error(path, err)
            } else {
                ScrapeError::Reqwest(err)
            }
        })
    }
}

fn status_error(path: &str, err: reqwest::Error) -> ScrapeError {
    match err.status() {
        Some(status) => ScrapeError::Status {
            path: path.to_string(),
            status,
        },
        None => ScrapeError::Reqwest(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    /// Answers the n-th request with `statuses[n]`, repeating the last one.
    fn serve_statuses(statuses: Vec<u16>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let status = statuses.get(n).or(statuses.last()).copied().unwrap_or(200);

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&buf[..read]),
                    }
                }

                let body = format!("page {status}");
                let response = format!(
                    "HTTP/1.1 {status} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn session(host: &str) -> SessionManager {
        SessionManager::new(host)
            .unwrap()
            .with_backoff_factor(Duration::from_millis(1))
    }

    #[test]
    fn test_backoff_is_exponential() {
        let factor = Duration::from_secs(1);
        assert_eq!(backoff(factor, 1), Duration::from_secs(1));
        assert_eq!(backoff(factor, 2), Duration::from_secs(2));
        assert_eq!(backoff(factor, 3), Duration::from_secs(4));
    }

    #[test]
    fn test_transient_status_is_retried() {
        let (host, hits) = serve_statuses(vec![503, 200]);
        let session = session(&host);

        assert_eq!(session.fetch("/word/x/").unwrap(), "page 200");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_exhausted_retries_rebuild_client() {
        let (host, hits) = serve_statuses(vec![429, 429, 429, 429, 200]);
        let session = session(&host);

        assert_eq!(session.fetch("/word/x/").unwrap(), "page 200");
        assert_eq!(hits.load(Ordering::SeqCst), 5);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_persistent_status_fails_after_rebuild() {
        let (host, hits) = serve_statuses(vec![503]);
        let session = session(&host);

        let result = session.fetch("/word/x/");

        assert!(matches!(
            result,
            Err(ScrapeError::Status { status, .. }) if status == StatusCode::SERVICE_UNAVAILABLE
        ));
        // 1 + 3 retries, twice
        assert_eq!(hits.load(Ordering::SeqCst), 8);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_other_status_body_is_returned() {
        let (host, hits) = serve_statuses(vec![404]);
        let session = session(&host);

        assert_eq!(session.fetch("/word/x/").unwrap(), "page 404");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rebuild_once_per_generation() {
        let session = SessionManager::new("https://forvo.com/").unwrap();
        assert_eq!(session.server_host, "https://forvo.com");
        assert_eq!(session.generation(), 0);

        // two workers failing on the same generation produce one rebuild
        let (first, _) = session.rebuild(0).unwrap();
        let (second, _) = session.rebuild(0).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_transport_failure_after_rebuild_propagates() {
        // nothing listens on the discard port
        let session = SessionManager::new("http://127.0.0.1:9").unwrap();

        let result = session.fetch("/word/test/");

        assert!(matches!(result, Err(ScrapeError::Reqwest(_))));
        assert_eq!(session.generation(), 1);
    }
}
