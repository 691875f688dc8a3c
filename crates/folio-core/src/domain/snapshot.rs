//! 포트폴리오 스냅샷 DTO.
//!
//! 요청 단위로 새로 생성되는 스냅샷이며, 호출자가 단독 소유합니다.
//! 과거 평가액은 저장하지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// 코인 하나의 평가 상세.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPosition {
    /// 소문자 심볼 기반 식별자 (예: "btc")
    pub id: String,
    /// 자산 심볼 (대문자, 예: "BTC")
    pub symbol: String,
    /// 총 보유량
    pub amount: Decimal,
    /// 현재 USD 단가
    pub price_usd: Decimal,
    /// 24시간 변동률 (%)
    pub change_24h_pct: Decimal,
    /// USD 평가액 (`amount * price_usd`)
    pub usd_value: Decimal,
    /// 기여한 거래소 이름 목록
    pub exchange_sources: Vec<String>,
}

/// 거래소별 수집 실패 보고.
///
/// 단일 거래소의 장애는 전체 집계를 중단시키지 않고 보고로만 남습니다.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    /// 거래소 표시 이름
    pub exchange: String,
    /// 실패 사유
    pub error: String,
}

/// 포트폴리오 요약 스냅샷.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    /// 총 USD 평가액
    pub total_usd: Decimal,
    /// 24시간 변동액 (USD)
    pub change_24h_usd: Decimal,
    /// 24시간 변동률 (%)
    pub change_24h_pct: Decimal,
    /// 보유 코인 수 (가격이 확인된 코인만)
    pub coins_owned: usize,
    /// 코인별 상세 목록
    pub coins: Vec<CoinPosition>,
    /// 거래소별 수집 실패 목록 (best-effort 스냅샷의 관측용 부록)
    pub failures: Vec<FailureReport>,
    /// 스냅샷 생성 시각
    pub generated_at: DateTime<Utc>,
}

impl PortfolioSnapshot {
    /// 보유 자산이 없는 빈 스냅샷.
    ///
    /// 모든 거래소가 실패한 경우 에러 대신 0 보유 스냅샷으로 degrade합니다.
    pub fn empty(failures: Vec<FailureReport>) -> Self {
        Self {
            total_usd: Decimal::ZERO,
            change_24h_usd: Decimal::ZERO,
            change_24h_pct: Decimal::ZERO,
            coins_owned: 0,
            coins: Vec::new(),
            failures,
            generated_at: Utc::now(),
        }
    }
}
