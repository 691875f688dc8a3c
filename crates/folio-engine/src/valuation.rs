//! 포트폴리오 평가 계산.
//!
//! 집계된 보유량과 현재 시세, 24시간 등락률을 결합해 USD 기준의
//! 포트폴리오 스냅샷을 만듭니다. 모든 금액 연산은 `rust_decimal`로
//! 수행하며, 나눗셈이 일어나는 지점에서만 소수 둘째 자리
//! round-half-up으로 반올림합니다.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tracing::{debug, warn};

use folio_core::{AggregatedHolding, CoinPosition, FailureReport, PortfolioSnapshot};

const HUNDRED: Decimal = dec!(100);

/// 평가 엔진.
///
/// 상태가 없으므로 자유롭게 공유할 수 있습니다.
#[derive(Debug, Default, Clone)]
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    /// 보유량 · 시세 · 등락률을 스냅샷으로 결합합니다.
    ///
    /// - 시세가 없는 심볼은 코인 목록과 합계에서 모두 제외
    /// - 등락률이 없는 심볼은 변동 0%로 취급
    /// - 24시간 전 가치는 `usd_value / (1 + pct/100)`의 역산으로 추정
    pub fn summarize(
        &self,
        holdings: &HashMap<String, AggregatedHolding>,
        prices: &HashMap<String, Decimal>,
        changes: &HashMap<String, Decimal>,
        failures: Vec<FailureReport>,
    ) -> PortfolioSnapshot {
        let mut coins = Vec::new();
        let mut total_usd = Decimal::ZERO;
        let mut total_previous = Decimal::ZERO;

        for (symbol, holding) in holdings {
            let Some(&price) = prices.get(symbol) else {
                warn!(symbol = %symbol, "No price available, excluding from valuation");
                continue;
            };

            let usd_value = round_usd(holding.amount * price);
            let change_pct = changes.get(symbol).copied().unwrap_or(Decimal::ZERO);
            let previous_value = previous_value(usd_value, change_pct);

            total_usd += usd_value;
            total_previous += previous_value;

            coins.push(CoinPosition {
                id: symbol.to_lowercase(),
                symbol: symbol.clone(),
                amount: holding.amount,
                price_usd: price,
                change_24h_pct: change_pct,
                usd_value,
                exchange_sources: holding.sources.iter().cloned().collect(),
            });
        }

        // 평가액 내림차순으로 정렬해 응답을 결정적으로 만듦
        coins.sort_by(|a, b| {
            b.usd_value
                .cmp(&a.usd_value)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        // 전체 등락률은 현재 총액 대비 비율
        let change_24h_usd = round_usd(total_usd - total_previous);
        let change_24h_pct = if total_usd > Decimal::ZERO {
            round_usd(change_24h_usd * HUNDRED / total_usd)
        } else {
            Decimal::ZERO
        };

        debug!(
            total_usd = %total_usd,
            change_24h_pct = %change_24h_pct,
            coins = coins.len(),
            "Portfolio valuation computed"
        );

        PortfolioSnapshot {
            total_usd,
            change_24h_usd,
            change_24h_pct,
            coins_owned: coins.len(),
            coins,
            failures,
            generated_at: chrono::Utc::now(),
        }
    }
}

/// 24시간 전 USD 가치를 역산합니다.
///
/// 분모 `1 + pct/100`이 0 이하(pct <= -100)가 되는 입력은 역산이
/// 무의미하므로 변동 없음으로 취급합니다.
fn previous_value(usd_value: Decimal, change_pct: Decimal) -> Decimal {
    let divisor = Decimal::ONE + change_pct / HUNDRED;
    if divisor <= Decimal::ZERO {
        return usd_value;
    }
    round_usd(usd_value / divisor)
}

/// USD 금액을 소수 둘째 자리 round-half-up으로 반올림.
fn round_usd(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
