//! HTTP fragment retrieval.

use super::{FragmentContent, FragmentFetcher, FragmentName, LoadOutcome};
use crate::options::SiteOptions;
use async_trait::async_trait;
use folio_shared::errors::{FolioError, FolioResult};
use http_body_util::{BodyExt, Empty};
use hyper::Uri;
use hyper::body::Bytes;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

/// Fetches `GET <base>/<sections_dir>/<name>.<extension>` over HTTP/1.1.
///
/// Only the status and body are consumed. Non-2xx responses resolve to
/// [`LoadOutcome::Failed`] carrying the status line.
pub struct HttpFragmentFetcher {
    base: String,
    sections_dir: String,
    extension: String,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl HttpFragmentFetcher {
    pub fn new(base: impl Into<String>) -> FolioResult<Self> {
        Self::from_options(base, &SiteOptions::default())
    }

    pub fn from_options(base: impl Into<String>, options: &SiteOptions) -> FolioResult<Self> {
        let base = base.into().trim_end_matches('/').to_string();
        let uri: Uri = base
            .parse()
            .map_err(|e| FolioError::Config(format!("invalid base url '{}': {}", base, e)))?;
        if uri.scheme_str() != Some("http") {
            return Err(FolioError::Config(format!(
                "base url '{}' must use the http scheme",
                base
            )));
        }

        Ok(Self {
            base,
            sections_dir: options.sections_dir.clone(),
            extension: options.extension.clone(),
            client: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    pub fn uri_for(&self, name: &FragmentName) -> FolioResult<Uri> {
        let raw = format!(
            "{}/{}/{}.{}",
            self.base, self.sections_dir, name, self.extension
        );
        raw.parse()
            .map_err(|e| FolioError::Config(format!("invalid fragment url '{}': {}", raw, e)))
    }
}

#[async_trait]
impl FragmentFetcher for HttpFragmentFetcher {
    async fn fetch(&self, name: &FragmentName) -> LoadOutcome {
        let uri = match self.uri_for(name) {
            Ok(uri) => uri,
            Err(e) => return LoadOutcome::failed(name, e.to_string()),
        };
        tracing::debug!(fragment = %name, %uri, "Requesting fragment");

        let response = match self.client.get(uri).await {
            Ok(response) => response,
            Err(e) => return LoadOutcome::failed(name, e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return LoadOutcome::failed(name, status.to_string());
        }

        let body = match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => return LoadOutcome::failed(name, e.to_string()),
        };

        match String::from_utf8(body.to_vec()) {
            Ok(content) => LoadOutcome::Loaded(FragmentContent::new(content)),
            Err(_) => LoadOutcome::failed(name, "response body is not valid UTF-8"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `/sections/header.html`; everything else is a 404.
    async fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf);
                    let (status, body) = if request.starts_with("GET /sections/header.html ") {
                        ("200 OK", "<header>hi</header>")
                    } else {
                        ("404 Not Found", "")
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let base = spawn_server().await;
        let fetcher = HttpFragmentFetcher::new(base).unwrap();

        match fetcher.fetch(&FragmentName::new("header").unwrap()).await {
            LoadOutcome::Loaded(content) => assert_eq!(content.as_str(), "<header>hi</header>"),
            LoadOutcome::Failed(e) => panic!("unexpected failure: {}", e),
        }
    }

    #[tokio::test]
    async fn test_non_success_status_fails() {
        let base = spawn_server().await;
        let fetcher = HttpFragmentFetcher::new(format!("{}/", base)).unwrap();

        match fetcher.fetch(&FragmentName::new("hero").unwrap()).await {
            LoadOutcome::Failed(e) => {
                let msg = e.to_string();
                assert!(msg.contains("'hero'"));
                assert!(msg.contains("404"));
            }
            LoadOutcome::Loaded(_) => panic!("404 must not load"),
        }
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(HttpFragmentFetcher::new("ftp://example.com").is_err());
        assert!(HttpFragmentFetcher::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_uri_for() {
        let fetcher = HttpFragmentFetcher::new("http://localhost:8080/site/").unwrap();
        let uri = fetcher.uri_for(&FragmentName::new("about").unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://localhost:8080/site/sections/about.html");
    }
}
