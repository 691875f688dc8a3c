//! 거래소 연동 계층.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - ExchangeConnector trait: 통합 거래소 인터페이스 (잔고/가격 조회)
//! - HMAC-SHA256 요청 서명
//! - 지수 백오프 재시도 (취소 가능)
//! - Binance 커넥터 (REST)
//! - 시뮬레이션 커넥터 (테스트 및 데모용)
//! - ConnectorRegistry: 거래소 이름 → 커넥터 해석

pub mod connector;
pub mod error;
pub mod registry;
pub mod retry;
pub mod signer;
pub mod simulated;
pub mod traits;

pub use connector::{BinanceConfig, BinanceConnector};
pub use error::*;
pub use registry::ConnectorRegistry;
pub use retry::{with_retry, RetryConfig};
pub use signer::{canonical_query, sign};
pub use simulated::SimulatedConnector;
pub use traits::*;
