//! 지수 백오프 재시도.
//!
//! 일시적 장애(네트워크 에러, 5xx, rate limit)에 대해 고정된 시도 한도까지
//! 재시도합니다. 대기 시간은 `initial_backoff * 2^(attempt-1)`로 두 배씩
//! 증가합니다. 인증 에러 등 치명적 에러는 즉시 실패합니다.
//!
//! 백오프 대기는 취소 토큰과 함께 select되므로, 종료 중인 호출자가
//! 잠든 태스크를 남기지 않습니다.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{ConnectorError, ConnectorResult};

/// 재시도 정책 설정.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 초기 백오프 간격
    pub initial_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// 애플리케이션 설정에서 생성.
    pub fn from_settings(settings: &folio_core::RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
        }
    }

    /// `attempt`번째 시도 실패 후 대기 시간 (attempt는 1부터 시작).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// 재시도 가능한 에러에 대해 지수 백오프로 작업을 재시도합니다.
///
/// - 성공하면 즉시 결과 반환
/// - 재시도 불가능한 에러(인증 실패 등)는 즉시 반환
/// - 재시도 가능한 에러는 백오프 후 재시도, 한도 소진 시
///   `ConnectorError::RetriesExhausted`로 래핑해 반환
/// - 백오프 대기 중 취소되면 `ConnectorError::Cancelled` 반환
pub async fn with_retry<T, F, Fut>(
    exchange: &str,
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> ConnectorResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ConnectorResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut last_error: Option<ConnectorError> = None;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                warn!(
                    exchange = %exchange,
                    attempt,
                    max_attempts,
                    error = %err,
                    "Transient exchange error, will retry"
                );
                last_error = Some(err);

                if attempt < max_attempts {
                    let delay = config.backoff_delay(attempt);
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ConnectorError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    let source = last_error
        .unwrap_or_else(|| ConnectorError::Unknown("retry loop exited without error".to_string()));

    Err(ConnectorError::RetriesExhausted {
        exchange: exchange.to_string(),
        attempts: max_attempts,
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result = with_retry("test", &RetryConfig::default(), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ConnectorError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_auth_error_fails_immediately() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: ConnectorResult<()> =
            with_retry("test", &RetryConfig::default(), &cancel, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ConnectorError::Unauthorized("bad key".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(ConnectorError::Unauthorized(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_exhausts_retries() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result: ConnectorResult<()> =
            with_retry("binance", &RetryConfig::default(), &cancel, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ConnectorError::Network("connection reset".to_string())) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ConnectorError::RetriesExhausted {
                exchange, attempts, ..
            }) => {
                assert_eq!(exchange, "binance");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let cancel = CancellationToken::new();

        let result = with_retry("test", &RetryConfig::default(), &cancel, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ConnectorError::RateLimited)
                } else {
                    Ok("recovered")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: ConnectorResult<()> =
            with_retry("test", &RetryConfig::default(), &cancel, || async {
                Err(ConnectorError::Network("down".to_string()))
            })
            .await;

        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }
}
