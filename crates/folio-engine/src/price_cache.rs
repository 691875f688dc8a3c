//! TTL 기반 가격 캐시.
//!
//! 심볼 → USD 가격을 프로세스 전역에서 캐싱합니다. 캐시는 동시 요약
//! 요청 간에 공유되는 유일한 상태이며, `tokio::sync::RwLock`으로
//! 구조적 안전성을 보장합니다.
//!
//! 동시성 계약: 두 요청이 같은 심볼에서 동시에 miss가 나면 둘 다
//! fetch할 수 있습니다 (마지막 쓰기가 승리). 이는 의도된 비용/단순성
//! 트레이드오프이며, 심볼당 최대 1회 fetch를 보장하지 않습니다.

use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use folio_exchange::ConnectorResult;

/// 캐시 항목.
#[derive(Debug, Clone)]
struct PriceEntry {
    price: Decimal,
    fetched_at: Instant,
}

/// 심볼 → USD 가격의 TTL 캐시.
///
/// 프로세스 시작 시 한 번 생성되어 명시적으로 주입됩니다. 암묵적으로
/// 초기화되지 않으며, 비우기는 관리 목적의 `clear` 호출로만 가능합니다.
pub struct PriceCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, PriceEntry>>,
}

impl PriceCache {
    /// 주어진 TTL로 캐시 생성.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// 애플리케이션 설정에서 생성.
    pub fn from_config(config: &folio_core::PriceCacheConfig) -> Self {
        Self::new(Duration::from_secs(config.ttl_secs))
    }

    /// 요청 심볼들의 가격을 반환합니다.
    ///
    /// TTL 이내의 캐시 항목은 그대로 사용하고, miss난 심볼 전체를 모아
    /// `fetch`를 **한 번** 호출합니다. 가져온 가격은 현재 시각으로
    /// 캐시에 기록됩니다. `fetch`가 가격을 반환하지 않은 심볼은 결과에서
    /// 빠지며, 부정 결과로 캐싱되지 않으므로 다음 요청이 다시 시도합니다.
    ///
    /// `fetch` 실패는 로그로만 남기고 캐시 히트만 반환합니다 — 가격
    /// 조회 실패가 요약 전체를 실패시키지 않습니다.
    pub async fn get_prices<F, Fut>(
        &self,
        symbols: &BTreeSet<String>,
        fetch: F,
    ) -> HashMap<String, Decimal>
    where
        F: FnOnce(BTreeSet<String>) -> Fut,
        Fut: Future<Output = ConnectorResult<HashMap<String, Decimal>>>,
    {
        let now = Instant::now();
        let mut prices = HashMap::new();
        let mut missing = BTreeSet::new();

        {
            let entries = self.entries.read().await;
            for symbol in symbols {
                match entries.get(symbol) {
                    // TTL과 같은 나이도 miss로 취급
                    Some(entry) if now.duration_since(entry.fetched_at) < self.ttl => {
                        prices.insert(symbol.clone(), entry.price);
                    }
                    _ => {
                        missing.insert(symbol.clone());
                    }
                }
            }
        }

        if missing.is_empty() {
            return prices;
        }

        debug!(misses = missing.len(), "Price cache miss, fetching");

        match fetch(missing).await {
            Ok(fresh) => {
                let mut entries = self.entries.write().await;
                for (symbol, price) in fresh {
                    // 0 또는 음수 가격은 저장하지 않음
                    if price <= Decimal::ZERO {
                        continue;
                    }
                    entries.insert(
                        symbol.clone(),
                        PriceEntry {
                            price,
                            fetched_at: now,
                        },
                    );
                    prices.insert(symbol, price);
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to fetch fresh prices, serving cache hits only");
            }
        }

        prices
    }

    /// 캐시된 항목 수.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 캐시가 비어 있는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 모든 항목 제거 (관리용).
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
