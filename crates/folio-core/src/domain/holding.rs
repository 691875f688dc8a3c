//! 통합 보유 자산.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;

/// 하나의 자산에 대한 거래소 통합 보유량.
///
/// 불변식: `amount > 0`인 항목만 집계 결과에 포함됩니다.
/// 0 또는 음수 잔고는 집계 전에 제외됩니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedHolding {
    /// 모든 거래소에 걸친 총 보유량
    pub amount: Decimal,
    /// 이 자산에 기여한 거래소 이름 집합
    pub sources: BTreeSet<String>,
}

impl AggregatedHolding {
    /// 거래소 잔고를 합산합니다.
    ///
    /// 교환법칙/결합법칙이 성립하므로 자격증명 처리 순서는 결과에
    /// 영향을 주지 않습니다.
    pub fn add(&mut self, exchange: &str, amount: Decimal) {
        self.amount += amount;
        self.sources.insert(exchange.to_string());
    }
}
