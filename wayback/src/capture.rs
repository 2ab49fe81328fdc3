use reqwest::header::CONTENT_LOCATION;
use reqwest::Method;
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, Result};

impl Client {
    /// Request a fresh crawl of `url`, returning the new snapshot's
    /// location.
    ///
    /// Crawl requests are not idempotent-safe, so no retry is applied. The
    /// response must carry a `Content-Location` header pointing at the
    /// created snapshot; a response without one is `Error::MissingLocation`.
    pub fn capture(&self, url: &str) -> Result<String> {
        let crawl_url = format!("{}/save/{}", self.config.base_url, url);

        debug!("requesting archive.org crawl via {crawl_url}");

        let response = self.do_request(Method::GET, &crawl_url, None)?;

        let location = response
            .headers
            .get(CONTENT_LOCATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        if location.is_empty() {
            return Err(Error::MissingLocation);
        }

        Ok(format!("{}{}", self.config.base_url, location))
    }
}
