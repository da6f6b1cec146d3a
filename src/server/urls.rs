//! URL reachability checks

use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::debug;

/// Outcome of checking a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlStatus {
    pub url: String,
    pub ok: bool,
    /// Last HTTP status seen, `None` when no response arrived
    pub status: Option<u16>,
}

/// Summary of a batch check
#[derive(Debug, Clone, Serialize)]
pub struct UrlReport {
    pub checked: usize,
    pub results: Vec<UrlStatus>,
    pub reachable: usize,
}

impl UrlReport {
    fn new(results: Vec<UrlStatus>) -> Self {
        Self {
            checked: results.len(),
            reachable: results.iter().filter(|r| r.ok).count(),
            results,
        }
    }
}

/// Probes URLs with HEAD, retrying with GET when HEAD gets no response
#[derive(Debug, Clone)]
pub struct UrlChecker {
    head_timeout: Duration,
    get_timeout: Duration,
    max_redirects: usize,
}

impl Default for UrlChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlChecker {
    pub fn new() -> Self {
        Self {
            head_timeout: Duration::from_secs(4),
            get_timeout: Duration::from_secs(6),
            max_redirects: 10,
        }
    }

    pub fn with_timeouts(mut self, head: Duration, get: Duration) -> Self {
        self.head_timeout = head;
        self.get_timeout = get;
        self
    }

    fn client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects))
            .build()
    }

    /// Check every URL concurrently; results keep input order
    pub async fn check_all(&self, urls: Vec<String>) -> reqwest::Result<UrlReport> {
        let client = self.client()?;
        let mut set = JoinSet::new();

        for (idx, url) in urls.into_iter().enumerate() {
            let client = client.clone();
            let checker = self.clone();
            set.spawn(async move { (idx, checker.check(&client, url).await) });
        }

        let mut results = Vec::with_capacity(set.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => debug!(error = %e, "URL check task did not complete"),
            }
        }
        results.sort_by_key(|(idx, _)| *idx);

        Ok(UrlReport::new(results.into_iter().map(|(_, r)| r).collect()))
    }

    async fn check(&self, client: &reqwest::Client, url: String) -> UrlStatus {
        let response = match client.head(&url).timeout(self.head_timeout).send().await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                debug!(url = %url, error = %e, "HEAD failed, retrying with GET");
                client.get(&url).timeout(self.get_timeout).send().await
            }
        };

        let status = match response {
            Ok(resp) => Some(resp.status().as_u16()),
            Err(e) => {
                debug!(url = %url, error = %e, "URL unreachable");
                None
            }
        };

        UrlStatus {
            ok: status.map_or(false, |s| (200..400).contains(&s)),
            status,
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_urls_keep_order() {
        let checker = UrlChecker::new()
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(200));
        let urls = vec![
            "not a url".to_string(),
            "http://127.0.0.1:1/".to_string(),
        ];

        let report = checker.check_all(urls.clone()).await.unwrap();

        assert_eq!(report.checked, 2);
        assert_eq!(report.reachable, 0);
        let seen: Vec<&str> = report.results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(seen, urls);
        assert!(report.results.iter().all(|r| !r.ok && r.status.is_none()));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let report = UrlChecker::new().check_all(Vec::new()).await.unwrap();
        assert_eq!(report.checked, 0);
        assert!(report.results.is_empty());
    }
}
