use std::collections::BTreeMap;

use anyhow::Context;
use reqwest::blocking::{Client, Response};
use tracing::debug;

use crate::Result;

const USER_AGENT: &str = concat!("nowpensions_scraper/", env!("CARGO_PKG_VERSION"));

/// HTTP session bound to one organisation on the provider site.
///
/// Cookies set by any response are replayed on every later request and redirects are
/// followed, so the login state carries over from the login POST to the details page.
#[derive(Debug)]
pub struct Session {
    client: Client,
    base_url: String,
}

impl Session {
    /// `host` is the provider root, e.g. `https://ae.nowpensions.com`.
    pub fn new(host: &str, organisation: &str) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::default())
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        let base_url = format!("{}/{}", host.trim_end_matches('/'), organisation);
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn get(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        debug!(%url, "GET");
        let r = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("GET {url} failed"))?;
        read_body(r, &url)
    }

    pub fn post_form(&self, path: &str, fields: &BTreeMap<String, String>) -> Result<String> {
        let url = self.url(path);
        debug!(%url, fields = fields.len(), "POST");
        let r = self
            .client
            .post(&url)
            .form(fields)
            .send()
            .with_context(|| format!("POST {url} failed"))?;
        read_body(r, &url)
    }
}

// Status codes are logged but never rejected: the site answers errors with regular pages.
fn read_body(r: Response, url: &str) -> Result<String> {
    debug!(status = %r.status(), final_url = %r.url(), "response");
    r.text()
        .with_context(|| format!("failed to read response body from {url}"))
}
