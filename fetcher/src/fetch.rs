//! The redirect-following, SSRF-re-checking GET.

use procontext_types::ProContextError;

use crate::allowlist::Allowlist;
use crate::domain::is_url_allowed;

const MAX_REDIRECT_HOPS: u32 = 3;

/// Performs one logical GET, manually following up to [`MAX_REDIRECT_HOPS`]
/// redirects and re-validating every hop against the allowlist. Never
/// caches; the allowlist is passed by value on every call.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    ssrf_domain_check: bool,
}

impl Fetcher {
    #[must_use]
    pub fn new(client: reqwest::Client, ssrf_domain_check: bool) -> Self {
        Self {
            client,
            ssrf_domain_check,
        }
    }

    pub async fn fetch(&self, url: &str, allowlist: &Allowlist) -> Result<String, ProContextError> {
        let mut current = url.to_string();
        let mut hops = 0u32;

        loop {
            if !is_url_allowed(&current, allowlist, true, self.ssrf_domain_check) {
                return Err(ProContextError::url_not_allowed(format!(
                    "url rejected by allowlist/private-IP rules: {current}"
                )));
            }

            let response = self
                .client
                .get(&current)
                .send()
                .await
                .map_err(|e| ProContextError::page_fetch_failed(e.to_string()))?;

            let status = response.status().as_u16();

            if matches!(status, 301 | 302 | 303 | 307 | 308) {
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        ProContextError::page_fetch_failed(
                            "redirect response missing Location header",
                        )
                    })?
                    .to_string();

                let base = url::Url::parse(&current).map_err(|e| {
                    ProContextError::page_fetch_failed(format!("invalid current url: {e}"))
                })?;
                let next = base.join(&location).map_err(|e| {
                    ProContextError::url_not_allowed(format!(
                        "could not resolve redirect target: {e}"
                    ))
                })?;

                hops += 1;
                if hops > MAX_REDIRECT_HOPS {
                    return Err(ProContextError::too_many_redirects(MAX_REDIRECT_HOPS));
                }

                current = next.to_string();
                continue;
            }

            if status == 404 {
                return Err(ProContextError::page_not_found(format!(
                    "upstream returned 404 for {current}"
                )));
            }

            if status >= 400 {
                return Err(ProContextError::page_fetch_failed(format!(
                    "upstream returned {status} for {current}"
                )));
            }

            return response
                .text()
                .await
                .map_err(|e| ProContextError::page_fetch_failed(e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowlist::Allowlist;
    use crate::client::build_http_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn allowlist_for(server: &MockServer) -> Allowlist {
        let host = url::Url::parse(&server.uri())
            .unwrap()
            .host_str()
            .unwrap()
            .to_string();
        Allowlist::from_domains([host])
    }

    #[tokio::test]
    async fn fetch_returns_body_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Hello"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(build_http_client().unwrap(), true);
        let allowlist = allowlist_for(&server);
        let body = fetcher
            .fetch(&format!("{}/doc", server.uri()), &allowlist)
            .await
            .unwrap();
        assert_eq!(body, "# Hello");
    }

    #[tokio::test]
    async fn fetch_maps_404_to_page_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(build_http_client().unwrap(), true);
        let allowlist = allowlist_for(&server);
        let err = fetcher
            .fetch(&format!("{}/missing", server.uri()), &allowlist)
            .await
            .unwrap_err();
        assert_eq!(err.code, procontext_types::ErrorCode::PageNotFound);
        assert!(!err.recoverable);
    }

    #[tokio::test]
    async fn fetch_maps_500_to_recoverable_page_fetch_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(build_http_client().unwrap(), true);
        let allowlist = allowlist_for(&server);
        let err = fetcher
            .fetch(&format!("{}/broken", server.uri()), &allowlist)
            .await
            .unwrap_err();
        assert_eq!(err.code, procontext_types::ErrorCode::PageFetchFailed);
        assert!(err.recoverable);
    }

    #[tokio::test]
    async fn fetch_follows_redirect_within_allowlist() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/final"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/final"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(build_http_client().unwrap(), true);
        let allowlist = allowlist_for(&server);
        let body = fetcher
            .fetch(&format!("{}/start", server.uri()), &allowlist)
            .await
            .unwrap();
        assert_eq!(body, "done");
    }

    #[tokio::test]
    async fn fetch_redirect_to_private_ip_is_blocked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("Location", "http://127.0.0.1/x"),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(build_http_client().unwrap(), true);
        let allowlist = allowlist_for(&server);
        let err = fetcher
            .fetch(&format!("{}/r", server.uri()), &allowlist)
            .await
            .unwrap_err();
        assert_eq!(err.code, procontext_types::ErrorCode::UrlNotAllowed);
        assert!(!allowlist.contains_domain("127.0.0.1"));
    }

    #[tokio::test]
    async fn fetch_exceeding_hop_limit_fails() {
        let server = MockServer::start().await;
        for i in 0..5 {
            let from = format!("/hop{i}");
            let to = format!("/hop{}", i + 1);
            Mock::given(method("GET"))
                .and(path(from))
                .respond_with(ResponseTemplate::new(302).insert_header("Location", to.as_str()))
                .mount(&server)
                .await;
        }

        let fetcher = Fetcher::new(build_http_client().unwrap(), true);
        let allowlist = allowlist_for(&server);
        let err = fetcher
            .fetch(&format!("{}/hop0", server.uri()), &allowlist)
            .await
            .unwrap_err();
        assert_eq!(err.code, procontext_types::ErrorCode::TooManyRedirects);
    }
}
