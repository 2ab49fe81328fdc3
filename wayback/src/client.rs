use std::thread;
use std::time::Duration;

use reqwest::header::{HeaderMap, HOST, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://web.archive.org";
pub const DEFAULT_HTTP_HOST: &str = "archive.org";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/65.0.3325.162 Safari/537.36";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Max number of download attempts before giving up.
pub const DEFAULT_MAX_TRIES: u32 = 10;

/// Connection settings for the archive.org endpoints.
///
/// Defaults match the public Wayback Machine; point `base_url` somewhere
/// else to exercise the client against a fake endpoint.
#[derive(Debug, Clone)]
pub struct Config {
    /// Archive.org server base URL address.
    pub base_url: String,
    /// 'Host' header to use.
    pub host: String,
    /// 'User-Agent' header to use.
    pub user_agent: String,
    /// Timeout applied to every HTTP request.
    pub timeout: Duration,
    /// Attempt budget for the retrying JSON fetch.
    pub max_tries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            host: DEFAULT_HTTP_HOST.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_tries: DEFAULT_MAX_TRIES,
        }
    }
}

/// Client for the archive.org Wayback Machine.
///
/// Immutable after construction, so a single instance can be shared freely
/// across threads.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) config: Config,
    http: reqwest::blocking::Client,
    pub(crate) sleep: fn(Duration),
}

/// A completed HTTP exchange with the body fully read.
pub(crate) struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl Client {
    pub fn new(config: Config) -> Self {
        Client {
            config,
            http: reqwest::blocking::Client::new(),
            sleep: thread::sleep,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute a single request with the configured headers and timeout.
    /// No retries happen at this layer.
    pub(crate) fn do_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let mut request = self
            .http
            .request(method, url)
            .header(HOST, &self.config.host)
            .header(USER_AGENT, &self.config.user_agent)
            .timeout(self.config.timeout);

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().map_err(|source| Error::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .map_err(|source| Error::Request {
                url: url.to_string(),
                source,
            })?
            .to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }

    /// GET returning the body, mapping non-2xx responses to `HttpStatus`.
    fn get_body(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.do_request(Method::GET, url, None)?;
        if !response.status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status.as_u16(),
            });
        }
        Ok(response.body)
    }

    /// GET `url` and decode its body as JSON, retrying 403 responses with
    /// exponential backoff up to the configured attempt budget.
    pub(crate) fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = fetch_with_retry(
            self.config.max_tries,
            || {
                debug!("downloading JSON data from {url}");
                self.get_body(url)
            },
            self.sleep,
        )?;

        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for Client {
    fn default() -> Self {
        Client::new(Config::default())
    }
}

/// Exponential backoff schedule: 30s initial interval, growing by 1.5x per
/// step, capped at 60s. Deterministic, no jitter.
pub(crate) struct Backoff {
    interval: Duration,
    multiplier: f64,
    max_interval: Duration,
}

impl Backoff {
    pub(crate) fn new() -> Self {
        Backoff {
            interval: Duration::from_secs(30),
            multiplier: 1.5,
            max_interval: Duration::from_secs(60),
        }
    }

    pub(crate) fn next(&mut self) -> Duration {
        let wait = self.interval;
        self.interval = self
            .interval
            .mul_f64(self.multiplier)
            .min(self.max_interval);
        wait
    }
}

/// Run `op` until it succeeds or the attempt budget runs out.
///
/// Retries are reserved for rate-limit style rejections: only an HTTP 403
/// response triggers another attempt. Any other failure, transport errors
/// and timeouts included, surfaces on first occurrence.
pub(crate) fn fetch_with_retry<F, S>(max_tries: u32, mut op: F, mut sleep: S) -> Result<Vec<u8>>
where
    F: FnMut() -> Result<Vec<u8>>,
    S: FnMut(Duration),
{
    let max_tries = max_tries.max(1);
    let mut backoff = Backoff::new();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let err = match op() {
            Ok(body) => return Ok(body),
            Err(err) => err,
        };

        let rate_limited = matches!(err, Error::HttpStatus { status: 403, .. });
        if !rate_limited || attempt >= max_tries {
            return Err(err);
        }

        let wait = backoff.next();
        warn!("retrying after {err} (attempt {attempt}/{max_tries}, next wait {wait:?})");
        sleep(wait);
    }
}
