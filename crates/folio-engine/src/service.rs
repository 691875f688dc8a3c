//! 포트폴리오 서비스 파사드.
//!
//! 자격증명 저장소, 커넥터 레지스트리, 가격 캐시, 집계/평가 엔진을
//! 하나의 진입점으로 묶습니다. 외부 표면(HTTP API 등)은 이 타입만
//! 의존하면 됩니다.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use folio_core::{AppConfig, Credential, PortfolioError, PortfolioResult, PortfolioSnapshot};
use folio_exchange::{
    Balance, BinanceConfig, BinanceConnector, ConnectionCheck, ConnectorRegistry, RetryConfig,
    SimulatedConnector,
};

use crate::aggregator::BalanceAggregator;
use crate::jobs::{JobRecord, JobStatus, SyncJobStore};
use crate::price_cache::PriceCache;
use crate::store::CredentialStore;
use crate::valuation::ValuationEngine;

/// 포트폴리오 조회/동기화 서비스.
pub struct PortfolioService {
    registry: Arc<ConnectorRegistry>,
    credentials: Arc<dyn CredentialStore>,
    aggregator: BalanceAggregator,
    valuation: ValuationEngine,
    price_cache: Arc<PriceCache>,
    jobs: SyncJobStore,
    /// 시세/등락률 조회에 사용할 거래소 이름
    market_data_exchange: String,
    cancel: CancellationToken,
}

impl PortfolioService {
    /// 구성 요소를 직접 주입해 서비스 생성.
    pub fn new(
        registry: Arc<ConnectorRegistry>,
        credentials: Arc<dyn CredentialStore>,
        price_cache: Arc<PriceCache>,
        market_data_exchange: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            aggregator: BalanceAggregator::new(Arc::clone(&registry)),
            registry,
            credentials,
            valuation: ValuationEngine::new(),
            price_cache,
            jobs: SyncJobStore::new(),
            market_data_exchange: market_data_exchange.into(),
            cancel,
        }
    }

    /// 설정 기반 서비스 생성. Binance와 시뮬레이션 커넥터를 등록합니다.
    pub fn from_config(
        config: &AppConfig,
        credentials: Arc<dyn CredentialStore>,
        cancel: CancellationToken,
    ) -> PortfolioResult<Self> {
        let retry = RetryConfig::from_settings(&config.retry);

        let mut registry = ConnectorRegistry::new();

        let binance_config = config
            .exchanges
            .get("binance")
            .map(BinanceConfig::from_exchange_config)
            .unwrap_or_default();
        let binance = BinanceConnector::new(binance_config, retry.clone(), cancel.child_token())
            .map_err(|e| PortfolioError::Internal(e.to_string()))?;
        registry.register(Arc::new(binance));
        registry.register(Arc::new(
            SimulatedConnector::new().with_retry_config(retry),
        ));

        Ok(Self::new(
            Arc::new(registry),
            credentials,
            Arc::new(PriceCache::from_config(&config.price_cache)),
            config.market_data.exchange.clone(),
            cancel,
        ))
    }

    /// 사용자의 전체 포트폴리오 요약을 계산합니다.
    ///
    /// 거래소 단위 실패는 스냅샷의 `failures`로 보고되고, 시세/등락률
    /// 조회 실패는 해당 심볼 제외 또는 변동 0%로 완화됩니다. 이
    /// 메서드가 에러를 반환하는 경우는 자격증명 저장소 접근 실패뿐입니다.
    pub async fn portfolio_summary(&self, user_id: Uuid) -> PortfolioResult<PortfolioSnapshot> {
        let credentials = self.credentials.list_credentials(user_id).await?;
        if credentials.is_empty() {
            info!(user_id = %user_id, "No credentials registered, returning empty portfolio");
            return Ok(PortfolioSnapshot::empty(vec![]));
        }

        let outcome = self.aggregator.aggregate(&credentials).await;

        let symbols: BTreeSet<String> = outcome.holdings.keys().cloned().collect();
        let (prices, changes) = self.market_data(&symbols).await;

        Ok(self
            .valuation
            .summarize(&outcome.holdings, &prices, &changes, outcome.failures))
    }

    /// 시세와 24시간 등락률을 조회합니다. 등락률 실패는 빈 맵으로 완화.
    async fn market_data(
        &self,
        symbols: &BTreeSet<String>,
    ) -> (
        HashMap<String, rust_decimal::Decimal>,
        HashMap<String, rust_decimal::Decimal>,
    ) {
        let Some(connector) = self.registry.resolve(&self.market_data_exchange) else {
            warn!(
                exchange = %self.market_data_exchange,
                "Market data exchange not registered"
            );
            return (HashMap::new(), HashMap::new());
        };

        let feed = Arc::clone(&connector);
        let prices = self
            .price_cache
            .get_prices(symbols, |missing| async move {
                feed.fetch_prices(&missing).await
            })
            .await;

        let changes = match connector.fetch_24h_change(symbols).await {
            Ok(changes) => changes,
            Err(err) => {
                warn!(error = %err, "24h change fetch failed, treating all symbols as flat");
                HashMap::new()
            }
        };

        (prices, changes)
    }

    /// 특정 거래소의 동기화를 백그라운드로 시작하고 작업 ID를 반환합니다.
    pub async fn sync_exchange(&self, user_id: Uuid, exchange: &str) -> PortfolioResult<Uuid> {
        let credential = self.find_credential(user_id, exchange).await?;
        let connector = self.resolve_connector(exchange)?;

        let job_id = self.jobs.enqueue(exchange).await;
        let jobs = self.jobs.clone();

        // 요청과 분리된 태스크로 실행, 결과는 작업 저장소로 보고
        tokio::spawn(async move {
            jobs.transition(job_id, JobStatus::Running).await;

            match connector.fetch_balances(&credential).await {
                Ok(balances) => {
                    info!(job_id = %job_id, assets = balances.len(), "Sync job completed");
                    jobs.transition(job_id, JobStatus::Completed).await;
                }
                Err(err) => {
                    error!(job_id = %job_id, error = %err, "Sync job failed");
                    jobs.transition(
                        job_id,
                        JobStatus::Failed {
                            error: err.to_string(),
                        },
                    )
                    .await;
                }
            }
        });

        Ok(job_id)
    }

    /// 동기화 작업 상태 조회.
    pub async fn job_status(&self, job_id: Uuid) -> Option<JobRecord> {
        self.jobs.get(job_id).await
    }

    /// 거래소별 원시 잔고를 조회합니다.
    ///
    /// 실패한 거래소는 결과에서 빠지고 경고 로그만 남습니다.
    pub async fn raw_balances(
        &self,
        user_id: Uuid,
    ) -> PortfolioResult<HashMap<String, HashMap<String, Balance>>> {
        let credentials = self.credentials.list_credentials(user_id).await?;

        let mut result = HashMap::new();
        for credential in &credentials {
            let Some(connector) = self.registry.resolve(&credential.exchange) else {
                warn!(exchange = %credential.exchange, "No connector for raw balance query");
                continue;
            };

            match connector.fetch_balances(credential).await {
                Ok(balances) => {
                    result.insert(connector.name().to_string(), balances);
                }
                Err(err) => {
                    warn!(exchange = %credential.exchange, error = %err, "Raw balance fetch failed");
                }
            }
        }

        Ok(result)
    }

    /// 저장된 자격증명으로 거래소 연결을 검증합니다.
    pub async fn test_exchange_connection(
        &self,
        user_id: Uuid,
        exchange: &str,
    ) -> PortfolioResult<ConnectionCheck> {
        let credential = self.find_credential(user_id, exchange).await?;
        let connector = self.resolve_connector(exchange)?;

        let check = connector.test_connection(&credential).await?;
        info!(exchange = %exchange, can_trade = check.can_trade, "Connection check passed");
        Ok(check)
    }

    /// 진행 중인 모든 거래소 호출을 취소합니다.
    pub fn shutdown(&self) {
        info!("Portfolio service shutting down, cancelling in-flight requests");
        self.cancel.cancel();
    }

    async fn find_credential(&self, user_id: Uuid, exchange: &str) -> PortfolioResult<Credential> {
        self.credentials
            .list_credentials(user_id)
            .await?
            .into_iter()
            .find(|c| c.exchange.eq_ignore_ascii_case(exchange))
            .ok_or_else(|| PortfolioError::NotFound(format!("{exchange} 자격증명")))
    }

    fn resolve_connector(
        &self,
        exchange: &str,
    ) -> PortfolioResult<Arc<dyn folio_exchange::ExchangeConnector>> {
        self.registry
            .resolve(exchange)
            .ok_or_else(|| PortfolioError::NotFound(format!("{exchange} 커넥터")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCredentialStore;
    use folio_core::crypto::generate_master_key;
    use folio_core::CredentialEncryptor;
    use folio_exchange::ExchangeConnector;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    async fn service_with(connector: SimulatedConnector) -> (PortfolioService, Uuid) {
        let name = connector.name().to_string();

        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(connector));

        let store = Arc::new(InMemoryCredentialStore::new(
            CredentialEncryptor::new(&generate_master_key()).unwrap(),
        ));
        let user = Uuid::new_v4();
        store
            .save_credential(user, &name, "key", "secret")
            .await
            .unwrap();

        let service = PortfolioService::new(
            Arc::new(registry),
            store,
            Arc::new(PriceCache::new(Duration::from_secs(30))),
            name,
            CancellationToken::new(),
        );
        (service, user)
    }

    #[tokio::test]
    async fn test_summary_with_simulated_dataset() {
        let (service, user) = service_with(SimulatedConnector::new()).await;

        let snapshot = service.portfolio_summary(user).await.unwrap();

        // BTC 0.5*45000 + ETH 10*3000 + BNB 100*310 + USDT 5000
        assert_eq!(snapshot.total_usd, dec!(88500.00));
        assert_eq!(snapshot.coins_owned, 4);
        assert!(snapshot.failures.is_empty());
        assert_eq!(snapshot.coins[0].symbol, "BNB");
    }

    #[tokio::test]
    async fn test_summary_without_credentials_is_empty() {
        let registry = Arc::new(ConnectorRegistry::new());
        let store = Arc::new(InMemoryCredentialStore::new(
            CredentialEncryptor::new(&generate_master_key()).unwrap(),
        ));
        let service = PortfolioService::new(
            registry,
            store,
            Arc::new(PriceCache::new(Duration::from_secs(30))),
            "simulated",
            CancellationToken::new(),
        );

        let snapshot = service.portfolio_summary(Uuid::new_v4()).await.unwrap();
        assert_eq!(snapshot.coins_owned, 0);
        assert_eq!(snapshot.total_usd, rust_decimal::Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_sync_job_lifecycle() {
        let (service, user) = service_with(SimulatedConnector::new()).await;

        let job_id = service.sync_exchange(user, "simulated").await.unwrap();

        // spawn된 태스크가 끝날 때까지 폴링
        let mut status = service.job_status(job_id).await.unwrap().status;
        for _ in 0..50 {
            if status == JobStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            status = service.job_status(job_id).await.unwrap().status;
        }
        assert_eq!(status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_sync_unknown_exchange_rejected() {
        let (service, user) = service_with(SimulatedConnector::new()).await;

        let result = service.sync_exchange(user, "kraken").await;
        assert!(matches!(result, Err(PortfolioError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_raw_balances_keyed_by_exchange() {
        let (service, user) = service_with(SimulatedConnector::new()).await;

        let balances = service.raw_balances(user).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances["simulated"]["BTC"].total(), dec!(0.5));
    }

    #[tokio::test]
    async fn test_connection_check_via_store() {
        let (service, user) = service_with(SimulatedConnector::new()).await;

        let check = service
            .test_exchange_connection(user, "simulated")
            .await
            .unwrap();
        assert!(check.can_trade);
    }
}
