//! 시뮬레이션 커넥터.
//!
//! 네트워크 없이 결정적인 잔고/가격을 반환하는 커넥터입니다.
//! 통합 테스트와 데모에서 실제 거래소 대신 사용하며, 서명과 재시도
//! 경로는 실제 커넥터와 동일하게 통과합니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::ExposeSecret;
use std::collections::{BTreeSet, HashMap};
use tokio_util::sync::CancellationToken;

use crate::error::{ConnectorError, ConnectorResult};
use crate::retry::{with_retry, RetryConfig};
use crate::signer;
use crate::traits::{Balance, ConnectionCheck, ExchangeConnector};
use folio_core::Credential;

/// 시뮬레이션 거래소 커넥터.
pub struct SimulatedConnector {
    name: String,
    balances: HashMap<String, Balance>,
    prices: HashMap<String, Decimal>,
    changes: HashMap<String, Decimal>,
    fail_balances: bool,
    retry: RetryConfig,
    cancel: CancellationToken,
}

impl SimulatedConnector {
    /// 기본 데이터셋으로 시뮬레이션 커넥터 생성.
    pub fn new() -> Self {
        let mut connector = Self::empty("simulated");

        connector = connector
            .with_balance("BTC", dec!(0.5), Decimal::ZERO)
            .with_balance("ETH", dec!(10), Decimal::ZERO)
            .with_balance("BNB", dec!(100), Decimal::ZERO)
            .with_balance("USDT", dec!(5000), Decimal::ZERO)
            .with_price("BTC", dec!(45000))
            .with_price("ETH", dec!(3000))
            .with_price("BNB", dec!(310))
            .with_price("USDT", Decimal::ONE)
            .with_price("DOGE", dec!(0.15))
            .with_change("BTC", dec!(2.5))
            .with_change("ETH", dec!(1.8))
            .with_change("BNB", dec!(3.2))
            .with_change("DOGE", dec!(5.1));

        connector
    }

    /// 데이터가 없는 빈 커넥터 생성.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            balances: HashMap::new(),
            prices: HashMap::new(),
            changes: HashMap::new(),
            fail_balances: false,
            retry: RetryConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// 잔고 추가.
    pub fn with_balance(mut self, asset: &str, free: Decimal, locked: Decimal) -> Self {
        let asset = asset.to_uppercase();
        self.balances.insert(
            asset.clone(),
            Balance {
                asset,
                free,
                locked,
            },
        );
        self
    }

    /// 가격 추가.
    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_uppercase(), price);
        self
    }

    /// 24시간 변동률 추가.
    pub fn with_change(mut self, symbol: &str, pct: Decimal) -> Self {
        self.changes.insert(symbol.to_uppercase(), pct);
        self
    }

    /// 잔고 조회가 일시 장애로 실패하도록 설정.
    ///
    /// 실패는 재시도 경로를 그대로 거치므로, 호출자는 재시도 한도 소진 후
    /// `RetriesExhausted`를 보게 됩니다.
    pub fn with_balance_failure(mut self) -> Self {
        self.fail_balances = true;
        self
    }

    /// 재시도 정책 오버라이드 (테스트에서 백오프 단축용).
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// 인증 경로 시뮬레이션: 실제 커넥터처럼 타임스탬프 쿼리를 서명.
    ///
    /// 빈 시크릿은 실제 커넥터와 동일하게 `InvalidCredential`로 거부됩니다.
    fn check_credential(&self, credential: &Credential) -> ConnectorResult<()> {
        let query = signer::canonical_query(&[("timestamp", "1000".to_string())]);
        signer::sign(&query, credential.api_secret.expose_secret())?;
        Ok(())
    }
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExchangeConnector for SimulatedConnector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_balances(
        &self,
        credential: &Credential,
    ) -> ConnectorResult<HashMap<String, Balance>> {
        self.check_credential(credential)?;

        with_retry(&self.name, &self.retry, &self.cancel, || async {
            if self.fail_balances {
                return Err(ConnectorError::Network("simulated outage".to_string()));
            }

            Ok(self
                .balances
                .iter()
                .filter(|(_, b)| b.free > Decimal::ZERO || b.locked > Decimal::ZERO)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        })
        .await
    }

    async fn fetch_prices(
        &self,
        symbols: &BTreeSet<String>,
    ) -> ConnectorResult<HashMap<String, Decimal>> {
        Ok(symbols
            .iter()
            .filter_map(|s| self.prices.get(s).map(|p| (s.clone(), *p)))
            .collect())
    }

    async fn fetch_24h_change(
        &self,
        symbols: &BTreeSet<String>,
    ) -> ConnectorResult<HashMap<String, Decimal>> {
        Ok(symbols
            .iter()
            .filter_map(|s| self.changes.get(s).map(|c| (s.clone(), *c)))
            .collect())
    }

    async fn test_connection(&self, credential: &Credential) -> ConnectorResult<ConnectionCheck> {
        self.check_credential(credential)?;

        Ok(ConnectionCheck {
            account_type: Some("SPOT".to_string()),
            can_trade: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn credential() -> Credential {
        Credential::new(Uuid::new_v4(), "simulated", "key", "secret")
    }

    #[tokio::test]
    async fn test_default_dataset() {
        let connector = SimulatedConnector::new();
        let balances = connector.fetch_balances(&credential()).await.unwrap();

        assert_eq!(balances["BTC"].total(), dec!(0.5));
        assert_eq!(balances["ETH"].total(), dec!(10));
    }

    #[tokio::test]
    async fn test_zero_balances_excluded() {
        let connector =
            SimulatedConnector::empty("simulated").with_balance("XRP", Decimal::ZERO, Decimal::ZERO);

        let balances = connector.fetch_balances(&credential()).await.unwrap();
        assert!(balances.is_empty());
    }

    #[tokio::test]
    async fn test_empty_secret_rejected() {
        let connector = SimulatedConnector::new();
        let bad = Credential::new(Uuid::new_v4(), "simulated", "key", "");

        let result = connector.fetch_balances(&bad).await;
        assert!(matches!(result, Err(ConnectorError::InvalidCredential(_))));
    }

    #[tokio::test]
    async fn test_unknown_price_omitted() {
        let connector = SimulatedConnector::new();
        let symbols: BTreeSet<String> = ["BTC", "SHIBA"].iter().map(|s| s.to_string()).collect();

        let prices = connector.fetch_prices(&symbols).await.unwrap();
        assert!(prices.contains_key("BTC"));
        assert!(!prices.contains_key("SHIBA"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_balance_failure_exhausts_retries() {
        let connector = SimulatedConnector::new()
            .with_balance_failure()
            .with_retry_config(RetryConfig {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
            });

        let result = connector.fetch_balances(&credential()).await;
        assert!(matches!(
            result,
            Err(ConnectorError::RetriesExhausted { attempts: 3, .. })
        ));
    }
}
