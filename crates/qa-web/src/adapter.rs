//! C6: the web-search port. `HttpWebSearch` is the production adapter
//! (a single deadline-bounded call to an external provider);
//! `MockWebSearch` is the deterministic test/dev default.

use std::time::Duration;

use async_trait::async_trait;
use qa_core::error::QaError;
use qa_core::ports::WebSearchAdapter;
use qa_core::types::WebResult;
use serde::Deserialize;

/// `reqwest`-backed adapter pointed at a configurable provider endpoint.
/// Never retries; a single call either completes within `timeout` or the
/// request is abandoned and surfaces as `QaError::TransportWebSearch`.
pub struct HttpWebSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpWebSearch {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

#[derive(Deserialize)]
struct ProviderResponse {
    #[serde(default)]
    results: Vec<ProviderResult>,
}

#[derive(Deserialize)]
struct ProviderResult {
    title: String,
    url: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

#[async_trait]
impl WebSearchAdapter for HttpWebSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        domain_bias: Option<&str>,
    ) -> Result<Vec<WebResult>, QaError> {
        let mut request = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.api_key)
            .query(&[("q", query), ("count", &max_results.to_string())]);

        if let Some(domain) = domain_bias {
            request = request.query(&[("site", domain)]);
        }

        let send = tokio::time::timeout(self.timeout, request.send());
        let response = match send.await {
            Ok(Ok(resp)) => resp,
            Ok(Err(err)) => return Err(QaError::TransportWebSearch(err.to_string())),
            Err(_) => {
                return Err(QaError::TransportWebSearch(format!(
                    "web search timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };

        if !response.status().is_success() {
            return Err(QaError::TransportWebSearch(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let parsed: ProviderResponse = response
            .json()
            .await
            .map_err(|err| QaError::TransportWebSearch(err.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| WebResult {
                title: r.title,
                url: r.url,
                snippet: r.snippet,
                fetched_date: r.published_date.unwrap_or_default(),
                score: r.score.unwrap_or(0.5),
            })
            .collect())
    }
}

/// Deterministic stand-in used by default in dev/tests: echoes the query
/// back into a fixed number of synthetic results.
pub struct MockWebSearch {
    fixed_results: Vec<WebResult>,
}

impl MockWebSearch {
    pub fn new() -> Self {
        Self {
            fixed_results: Vec::new(),
        }
    }

    /// Serve the same fixed set of results for every query, ignoring
    /// `query`/`max_results`/`domain_bias` beyond the result cap.
    pub fn with_fixed_results(results: Vec<WebResult>) -> Self {
        Self {
            fixed_results: results,
        }
    }
}

impl Default for MockWebSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearchAdapter for MockWebSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        _domain_bias: Option<&str>,
    ) -> Result<Vec<WebResult>, QaError> {
        if !self.fixed_results.is_empty() {
            return Ok(self.fixed_results.iter().take(max_results).cloned().collect());
        }

        let count = max_results.min(3);
        Ok((1..=count)
            .map(|i| WebResult {
                title: format!("{query} 관련 공식 안내 {i}"),
                url: format!("https://example.gov/notice/{i}"),
                snippet: format!("{query}에 대한 신청 절차 안내입니다."),
                fetched_date: "2026-01-01".to_string(),
                score: 1.0 - (i as f64 - 1.0) * 0.1,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_web_search_generates_results() {
        let adapter = MockWebSearch::new();
        let results = adapter.search("창업 지원금", 3, None).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].title.contains("창업 지원금"));
    }

    #[tokio::test]
    async fn test_mock_web_search_caps_at_three_by_default() {
        let adapter = MockWebSearch::new();
        let results = adapter.search("query", 5, None).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_web_search_respects_lower_max_results() {
        let adapter = MockWebSearch::new();
        let results = adapter.search("query", 1, None).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_web_search_with_fixed_results() {
        let fixed = vec![WebResult {
            title: "고정 결과".into(),
            url: "https://example.gov/fixed".into(),
            snippet: "snippet".into(),
            fetched_date: "2026-01-01".into(),
            score: 0.9,
        }];
        let adapter = MockWebSearch::with_fixed_results(fixed.clone());
        let results = adapter.search("anything", 5, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "고정 결과");
    }

    #[tokio::test]
    async fn test_mock_web_search_scores_descend() {
        let adapter = MockWebSearch::new();
        let results = adapter.search("query", 3, None).await.unwrap();
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
    }

    #[test]
    fn test_http_web_search_constructs_with_timeout() {
        let adapter = HttpWebSearch::new("https://search.example/api", "key", 10_000);
        assert_eq!(adapter.timeout, Duration::from_millis(10_000));
    }
}
