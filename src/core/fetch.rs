use crate::core::rate::RateController;
use crate::utils::error::{HarvestError, Result};
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// 重試預算與退避節奏,測試時可以縮短
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
        }
    }
}

const CHALLENGE_MARKERS: &str = r"(?i)just a moment|cf-chl|challenge-platform|attention required";

// 單次嘗試的失敗分類,決定重試迴圈怎麼走
enum AttemptError {
    Challenge,
    RateLimited(String),
    Transient(String),
    Malformed(String),
}

pub struct HttpFetcher {
    client: Client,
    limiter: RateController,
    policy: FetchPolicy,
    challenge_re: Regex,
}

impl HttpFetcher {
    pub fn new(limiter: RateController) -> Self {
        Self::with_policy(limiter, FetchPolicy::default())
    }

    pub fn with_policy(limiter: RateController, policy: FetchPolicy) -> Self {
        Self {
            client: Client::new(),
            limiter,
            policy,
            challenge_re: Regex::new(CHALLENGE_MARKERS).expect("challenge marker pattern is valid"),
        }
    }

    pub fn current_rate(&self) -> f64 {
        self.limiter.current_rate()
    }

    /// 單一 GET:挑戰直接失敗,429 降速後重試,其他暫時性錯誤按退避重試到預算用完
    pub async fn fetch(&self, url: &str) -> Result<serde_json::Value> {
        let mut backoff = self.policy.initial_backoff;
        let mut last_error = String::from("no attempts made");

        for attempt in 1..=self.policy.max_attempts {
            self.limiter.wait().await;
            tracing::debug!(
                "📡 GET {} (attempt {}/{})",
                url,
                attempt,
                self.policy.max_attempts
            );

            match self.attempt(url).await {
                Ok(value) => {
                    self.limiter.on_success();
                    if attempt > 1 {
                        tracing::info!("📡 Request succeeded after {} attempts", attempt);
                    }
                    return Ok(value);
                }
                Err(AttemptError::Challenge) => {
                    tracing::error!("❌ Anti-bot challenge detected at {}", url);
                    return Err(HarvestError::ChallengeDetected {
                        url: url.to_string(),
                    });
                }
                Err(AttemptError::Malformed(context)) => {
                    return Err(HarvestError::MalformedData { context });
                }
                Err(AttemptError::RateLimited(message)) => {
                    self.limiter.on_rate_limited();
                    last_error = message;
                }
                Err(AttemptError::Transient(message)) => {
                    last_error = message;
                }
            }

            if attempt < self.policy.max_attempts {
                tracing::warn!(
                    "🔶 {} failed ({}), retrying in {:?}",
                    url,
                    last_error,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(self.policy.max_backoff);
            }
        }

        tracing::error!(
            "❌ Giving up on {} after {} attempts",
            url,
            self.policy.max_attempts
        );
        Err(HarvestError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    async fn attempt(&self, url: &str) -> std::result::Result<serde_json::Value, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited(format!("HTTP {}", status)));
        }

        // Cloudflare 類的盾牌頁走 403/503,要看 body 的標記才分得出來
        if status == StatusCode::FORBIDDEN || status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            if self.challenge_re.is_match(&body) {
                return Err(AttemptError::Challenge);
            }
            return Err(AttemptError::Transient(format!("HTTP {}", status)));
        }

        if !status.is_success() {
            return Err(AttemptError::Transient(format!("HTTP {}", status)));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AttemptError::Malformed(format!("response body is not JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn fast_fetcher(max_attempts: u32) -> HttpFetcher {
        let limiter = RateController::new(1000.0).with_jitter_cap(Duration::ZERO);
        HttpFetcher::with_policy(
            limiter,
            FetchPolicy {
                max_attempts,
                initial_backoff: Duration::from_millis(5),
                max_backoff: Duration::from_millis(20),
            },
        )
    }

    #[tokio::test]
    async fn test_fetch_success_returns_json_payload() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/data");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"ok": true}));
        });

        let fetcher = fast_fetcher(3);
        let value = fetcher.fetch(&server.url("/data")).await.unwrap();

        api_mock.assert();
        assert_eq!(value.get("ok").unwrap().as_bool().unwrap(), true);
    }

    #[tokio::test]
    async fn test_challenge_fails_fast_without_retry() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/data");
            then.status(403)
                .body("<html><title>Just a moment...</title></html>");
        });

        let fetcher = fast_fetcher(5);
        let result = fetcher.fetch(&server.url("/data")).await;

        api_mock.assert_hits(1);
        assert!(matches!(
            result,
            Err(HarvestError::ChallengeDetected { .. })
        ));
    }

    #[tokio::test]
    async fn test_plain_403_is_treated_as_transient() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/data");
            then.status(403).body("forbidden");
        });

        let fetcher = fast_fetcher(2);
        let result = fetcher.fetch(&server.url("/data")).await;

        api_mock.assert_hits(2);
        assert!(matches!(
            result,
            Err(HarvestError::RetriesExhausted { attempts: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_all_attempts() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/data");
            then.status(500);
        });

        let fetcher = fast_fetcher(3);
        let result = fetcher.fetch(&server.url("/data")).await;

        api_mock.assert_hits(3);
        match result {
            Err(HarvestError::RetriesExhausted {
                attempts,
                last_error,
                ..
            }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("500"));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limited_responses_lower_the_rate() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/data");
            then.status(429);
        });

        let fetcher = fast_fetcher(2);
        let before = fetcher.current_rate();
        let result = fetcher.fetch(&server.url("/data")).await;

        api_mock.assert_hits(2);
        assert!(matches!(result, Err(HarvestError::RetriesExhausted { .. })));
        assert!(
            fetcher.current_rate() < before,
            "every 429 should slow the controller down"
        );
    }

    // 依序吐出預先寫好的回應,一條連線一個回應
    async fn scripted_server(responses: Vec<String>) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        addr
    }

    fn response_429() -> String {
        "HTTP/1.1 429 Too Many Requests\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            .to_string()
    }

    fn response_json_ok(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[tokio::test]
    async fn test_429_three_times_then_success_completes_with_lowered_rate() {
        let addr = scripted_server(vec![
            response_429(),
            response_429(),
            response_429(),
            response_json_ok(r#"{"ok":true}"#),
        ])
        .await;

        let fetcher = fast_fetcher(5);
        let before = fetcher.current_rate();
        let value = fetcher
            .fetch(&format!("http://{}/data", addr))
            .await
            .unwrap();

        assert_eq!(value.get("ok").unwrap().as_bool().unwrap(), true);
        assert!(
            fetcher.current_rate() < before,
            "rate should still be below the starting point after recovery"
        );
    }

    #[tokio::test]
    async fn test_non_json_success_body_is_malformed_data() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/data");
            then.status(200).body("<html>not json</html>");
        });

        let fetcher = fast_fetcher(3);
        let result = fetcher.fetch(&server.url("/data")).await;

        api_mock.assert_hits(1);
        assert!(matches!(result, Err(HarvestError::MalformedData { .. })));
    }
}
