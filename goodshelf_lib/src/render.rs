//! Rendering collaborator: produces a logged-in HTML document for a URL.
//!
//! The authenticated session itself is established out-of-band; the operator
//! hands over a session cookie and [`HttpRenderer`] attaches it to every
//! request. Anything that can fetch a document can stand in for
//! [`HttpRenderer`] behind the [`Renderer`] trait.

use std::time::Duration;

use url::Url;

use crate::user_agent::get_user_agent;

/// Errors from the rendering collaborator.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// Transport-level failure: network error, timeout, malformed response.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The site answered with a non-success status.
    #[error("unexpected status {status}")]
    HttpStatus { status: u16, body: String },
}

/// Produces a rendered HTML document for a URL.
pub trait Renderer {
    fn render(
        &self,
        url: &Url,
    ) -> impl std::future::Future<Output = Result<String, RenderError>> + Send;
}

/// Renderer backed by a plain HTTP client with browser-like headers and a
/// randomized user agent. Sufficient for listings that render server-side.
pub struct HttpRenderer {
    http: reqwest::Client,
    cookie: Option<String>,
}

impl HttpRenderer {
    /// Builds a renderer; `cookie` carries the operator's authenticated
    /// session and is sent verbatim as the `Cookie` header when present.
    pub fn new(cookie: Option<String>) -> Result<Self, RenderError> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, cookie })
    }
}

impl Renderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<String, RenderError> {
        let mut request = self
            .http
            .get(url.clone())
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .header("cache-control", "no-cache");
        if let Some(cookie) = &self.cookie {
            request = request.header("cookie", cookie.as_str());
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("render of {} failed with status {}", url, status);
            return Err(RenderError::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_body_untouched() {
        assert_eq!(truncate_body("hello"), "hello");
    }

    #[test]
    fn truncate_long_body() {
        let body = "x".repeat(5000);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
        assert_eq!(out.len(), 2000 + "...[truncated]".len());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(1500);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
    }
}
