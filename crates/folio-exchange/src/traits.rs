//! 거래소 trait 정의.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

use crate::error::{ConnectorError, ConnectorResult};
use folio_core::Credential;

/// 자산의 잔고 정보.
#[derive(Debug, Clone)]
pub struct Balance {
    /// 자산 심볼 (대문자, 예: "BTC", "USDT")
    pub asset: String,
    /// 사용 가능한 잔고
    pub free: Decimal,
    /// 주문에 묶인 잔고
    pub locked: Decimal,
}

impl Balance {
    /// 총 잔고 반환 (사용 가능 + 묶인 잔고).
    pub fn total(&self) -> Decimal {
        self.free + self.locked
    }
}

/// 자격증명 연결 테스트 결과.
#[derive(Debug, Clone)]
pub struct ConnectionCheck {
    /// 계좌 유형 (거래소가 보고하는 경우)
    pub account_type: Option<String>,
    /// 거래 가능 여부
    pub can_trade: bool,
}

/// 통합 거래소 커넥터 인터페이스.
///
/// 거래소마다 하나의 구현이 존재하며, `ConnectorRegistry`를 통해
/// 표시 이름으로 해석됩니다. 커넥터는 영속 상태를 갖지 않습니다 —
/// 부작용은 네트워크 I/O뿐입니다.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// 거래소 표시 이름 반환.
    fn name(&self) -> &str;

    /// 자격증명으로 인증 요청을 보내 잔고를 조회합니다.
    ///
    /// free와 locked가 모두 0인 자산은 결과에서 제외됩니다. 심볼은
    /// 대문자로 정규화됩니다. 일시적 장애는 지수 백오프로 재시도되며,
    /// 인증 실패는 즉시 반환됩니다.
    async fn fetch_balances(
        &self,
        credential: &Credential,
    ) -> ConnectorResult<HashMap<String, Balance>>;

    /// 요청된 심볼들의 현재 USD 가격을 조회합니다 (인증 불필요).
    ///
    /// 거래소가 가격을 보고하지 않는 심볼은 결과에서 생략됩니다
    /// (에러가 아님).
    async fn fetch_prices(
        &self,
        symbols: &BTreeSet<String>,
    ) -> ConnectorResult<HashMap<String, Decimal>>;

    /// 요청된 심볼들의 24시간 변동률(%)을 조회합니다 (인증 불필요).
    ///
    /// 기본 구현은 빈 맵을 반환하며, 알 수 없는 변동률은 하류에서
    /// 0%로 처리됩니다.
    async fn fetch_24h_change(
        &self,
        symbols: &BTreeSet<String>,
    ) -> ConnectorResult<HashMap<String, Decimal>> {
        let _ = symbols;
        Ok(HashMap::new())
    }

    /// 자격증명 유효성을 검사합니다 (계좌 조회).
    ///
    /// 기본 구현은 지원하지 않음을 반환합니다.
    async fn test_connection(&self, credential: &Credential) -> ConnectorResult<ConnectionCheck> {
        let _ = credential;
        Err(ConnectorError::NotSupported(format!(
            "connection test not supported by {}",
            self.name()
        )))
    }
}
