//! 거래소별 잔고 집계.
//!
//! 사용자의 모든 자격증명에 대해 커넥터를 해석하고 잔고를 조회해
//! 자산 심볼별로 병합합니다. 거래소 호출은 동시에 발행되며, 병합은
//! 교환법칙/결합법칙이 성립하므로 완료 순서는 결과에 영향을 주지
//! 않습니다.
//!
//! 전파 정책: 거래소 단위의 모든 에러는 이 경계에서 봉쇄됩니다.
//! 단일 거래소 장애는 실패 보고로만 남고 나머지 집계는 계속됩니다.

use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use folio_core::{AggregatedHolding, Credential, FailureReport};
use folio_exchange::{Balance, ConnectorRegistry};

/// 집계 결과: 병합된 보유 자산 + 거래소별 실패 보고.
#[derive(Debug, Default)]
pub struct AggregationOutcome {
    /// 심볼 → 통합 보유량
    pub holdings: HashMap<String, AggregatedHolding>,
    /// 거래소별 수집 실패 목록
    pub failures: Vec<FailureReport>,
}

/// 잔고 집계기.
pub struct BalanceAggregator {
    registry: Arc<ConnectorRegistry>,
}

impl BalanceAggregator {
    /// 레지스트리로 집계기 생성.
    pub fn new(registry: Arc<ConnectorRegistry>) -> Self {
        Self { registry }
    }

    /// 자격증명 목록의 잔고를 병합합니다.
    ///
    /// - 레지스트리에 없는 거래소는 실패 보고 후 건너뜀
    /// - 커넥터 에러(재시도 소진 포함)도 실패 보고 후 계속
    /// - 총량이 0 이하인 잔고는 병합 전에 제외
    pub async fn aggregate(&self, credentials: &[Credential]) -> AggregationOutcome {
        let fetches = credentials.iter().map(|credential| async move {
            let exchange = credential.exchange.clone();

            let Some(connector) = self.registry.resolve(&exchange) else {
                warn!(exchange = %exchange, "No connector registered, skipping credential");
                return Err(FailureReport {
                    exchange,
                    error: "unsupported exchange".to_string(),
                });
            };

            match connector.fetch_balances(credential).await {
                Ok(balances) => Ok((connector.name().to_string(), balances)),
                Err(err) => {
                    warn!(exchange = %exchange, error = %err, "Balance fetch failed");
                    Err(FailureReport {
                        exchange,
                        error: err.to_string(),
                    })
                }
            }
        });

        let mut outcome = AggregationOutcome::default();

        for result in join_all(fetches).await {
            match result {
                Ok((exchange, balances)) => {
                    Self::merge(&mut outcome.holdings, &exchange, balances)
                }
                Err(report) => outcome.failures.push(report),
            }
        }

        info!(
            assets = outcome.holdings.len(),
            failures = outcome.failures.len(),
            "Balance aggregation complete"
        );

        outcome
    }

    /// 한 거래소의 잔고를 누적 맵에 병합.
    fn merge(
        holdings: &mut HashMap<String, AggregatedHolding>,
        exchange: &str,
        balances: HashMap<String, Balance>,
    ) {
        for (symbol, balance) in balances {
            let total = balance.total();
            // 양수 보유량만 포함
            if total <= Decimal::ZERO {
                continue;
            }

            holdings
                .entry(symbol.to_uppercase())
                .or_default()
                .add(exchange, total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_exchange::SimulatedConnector;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn registry_with(connectors: Vec<SimulatedConnector>) -> Arc<ConnectorRegistry> {
        let mut registry = ConnectorRegistry::new();
        for connector in connectors {
            registry.register(Arc::new(connector));
        }
        Arc::new(registry)
    }

    fn credential_for(exchange: &str) -> Credential {
        Credential::new(Uuid::new_v4(), exchange, "key", "secret")
    }

    #[tokio::test]
    async fn test_merges_across_exchanges() {
        let ex1 = SimulatedConnector::empty("ex1").with_balance("BTC", dec!(0.3), Decimal::ZERO);
        let ex2 = SimulatedConnector::empty("ex2")
            .with_balance("BTC", dec!(0.2), Decimal::ZERO)
            .with_balance("ETH", dec!(10), Decimal::ZERO);

        let aggregator = BalanceAggregator::new(registry_with(vec![ex1, ex2]));
        let credentials = [credential_for("ex1"), credential_for("ex2")];

        let outcome = aggregator.aggregate(&credentials).await;

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.holdings["BTC"].amount, dec!(0.5));
        assert_eq!(
            outcome.holdings["BTC"].sources,
            ["ex1".to_string(), "ex2".to_string()].into_iter().collect()
        );
        assert_eq!(outcome.holdings["ETH"].amount, dec!(10));
        assert_eq!(
            outcome.holdings["ETH"].sources,
            ["ex2".to_string()].into_iter().collect()
        );
    }

    #[tokio::test]
    async fn test_non_positive_balances_dropped() {
        let ex1 = SimulatedConnector::empty("ex1")
            .with_balance("BTC", dec!(1), Decimal::ZERO)
            .with_balance("DUST", Decimal::ZERO, Decimal::ZERO);

        let aggregator = BalanceAggregator::new(registry_with(vec![ex1]));
        let outcome = aggregator.aggregate(&[credential_for("ex1")]).await;

        assert!(outcome.holdings.contains_key("BTC"));
        assert!(!outcome.holdings.contains_key("DUST"));
    }

    #[tokio::test]
    async fn test_unknown_exchange_skipped_with_report() {
        let aggregator = BalanceAggregator::new(registry_with(vec![]));
        let outcome = aggregator.aggregate(&[credential_for("kraken")]).await;

        assert!(outcome.holdings.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].exchange, "kraken");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_exchange_does_not_abort_aggregation() {
        let healthy = SimulatedConnector::empty("healthy")
            .with_balance("ETH", dec!(5), Decimal::ZERO);
        let broken = SimulatedConnector::empty("broken").with_balance_failure();

        let aggregator = BalanceAggregator::new(registry_with(vec![healthy, broken]));
        let credentials = [credential_for("healthy"), credential_for("broken")];

        let outcome = aggregator.aggregate(&credentials).await;

        // 살아남은 거래소의 보유량은 유지되고, 실패는 보고로만 남음
        assert_eq!(outcome.holdings["ETH"].amount, dec!(5));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].exchange, "broken");
        assert!(outcome.failures[0].error.contains("retries exhausted"));
    }

    #[tokio::test]
    async fn test_all_exchanges_failing_degrades_to_empty() {
        let aggregator = BalanceAggregator::new(registry_with(vec![]));
        let credentials = [credential_for("a"), credential_for("b")];

        let outcome = aggregator.aggregate(&credentials).await;

        assert!(outcome.holdings.is_empty());
        assert_eq!(outcome.failures.len(), 2);
    }

    proptest! {
        /// 자격증명 순서를 뒤섞어도 집계 결과는 동일해야 한다.
        #[test]
        fn prop_aggregation_invariant_under_permutation(seed in 0u64..1000) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let ex1 = SimulatedConnector::empty("ex1")
                    .with_balance("BTC", dec!(0.3), Decimal::ZERO)
                    .with_balance("ETH", dec!(2), dec!(1));
                let ex2 = SimulatedConnector::empty("ex2")
                    .with_balance("BTC", dec!(0.2), Decimal::ZERO);
                let ex3 = SimulatedConnector::empty("ex3")
                    .with_balance("DOGE", dec!(1000), Decimal::ZERO);

                let aggregator = BalanceAggregator::new(registry_with(vec![ex1, ex2, ex3]));

                let mut credentials = vec![
                    credential_for("ex1"),
                    credential_for("ex2"),
                    credential_for("ex3"),
                ];
                // seed 기반의 단순 회전 순열
                credentials.rotate_left((seed % 3) as usize);

                let outcome = aggregator.aggregate(&credentials).await;

                prop_assert_eq!(outcome.holdings["BTC"].amount, dec!(0.5));
                prop_assert_eq!(outcome.holdings["ETH"].amount, dec!(3));
                prop_assert_eq!(outcome.holdings["DOGE"].amount, dec!(1000));
                Ok(())
            })?;
        }
    }
}
