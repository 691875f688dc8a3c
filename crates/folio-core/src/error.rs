//! 포트폴리오 시스템의 에러 타입.
//!
//! 이 모듈은 엔진 계층 전반에서 사용되는 에러 타입을 정의합니다.
//! 거래소 전송 계층의 에러는 `folio-exchange`의 `ConnectorError`로
//! 별도 정의되며, 엔진 경계에서 이 타입으로 변환됩니다.

use thiserror::Error;

/// 핵심 포트폴리오 에러.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 자격증명 에러 (잘못된 형식, 빈 시크릿 등)
    #[error("자격증명 에러: {0}")]
    Credential(String),

    /// 암호화/복호화 에러
    #[error("암호화 에러: {0}")]
    Crypto(String),

    /// 거래소 연동 에러
    #[error("거래소 에러: {0}")]
    Exchange(String),

    /// 인증 에러
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 포트폴리오 작업을 위한 Result 타입.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

impl PortfolioError {
    /// 재시도 가능한 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortfolioError::Network(_))
    }

    /// 치명적인 에러인지 확인합니다.
    ///
    /// 치명적 에러는 해당 자격증명에 대해 재시도 없이 실패 처리됩니다.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            PortfolioError::Auth(_) | PortfolioError::Credential(_) | PortfolioError::Crypto(_)
        )
    }
}

impl From<serde_json::Error> for PortfolioError {
    fn from(err: serde_json::Error) -> Self {
        PortfolioError::Serialization(err.to_string())
    }
}

impl From<crate::crypto::CryptoError> for PortfolioError {
    fn from(err: crate::crypto::CryptoError) -> Self {
        PortfolioError::Crypto(err.to_string())
    }
}
