//! 거래소 커넥터 에러 타입.

use thiserror::Error;

/// 거래소 연동 관련 에러.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 인증/권한 에러 (잘못된 서명, 폐기된 키)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 자격증명 형식 에러 (빈 시크릿 등)
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 거래소 API 에러 코드
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 재시도 한도 소진 (거래소 단위의 최종 실패)
    #[error("{exchange}: retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        exchange: String,
        attempts: u32,
        #[source]
        source: Box<ConnectorError>,
    },

    /// 호출자 측 취소
    #[error("Request cancelled")]
    Cancelled,

    /// 지원되지 않는 작업/거래소
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// 거래소 작업을 위한 Result 타입.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

impl ConnectorError {
    /// 재시도 가능한 에러인지 확인.
    ///
    /// 일시적 장애(네트워크, 타임아웃, rate limit, 5xx)만 재시도 대상입니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConnectorError::Network(_)
            | ConnectorError::RateLimited
            | ConnectorError::Timeout(_) => true,
            ConnectorError::ApiError { code, .. } => (500..600).contains(code),
            _ => false,
        }
    }

    /// 인증 에러인지 확인.
    ///
    /// 인증 에러는 재시도 없이 해당 자격증명에 대해 즉시 실패 처리됩니다.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ConnectorError::Unauthorized(_) | ConnectorError::InvalidCredential(_)
        )
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ConnectorError::Timeout(err.to_string())
        } else if err.is_connect() {
            ConnectorError::Network(err.to_string())
        } else {
            ConnectorError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::ParseError(err.to_string())
    }
}

impl From<ConnectorError> for folio_core::PortfolioError {
    fn from(err: ConnectorError) -> Self {
        use folio_core::PortfolioError;

        match err {
            ConnectorError::Unauthorized(msg) => PortfolioError::Auth(msg),
            ConnectorError::InvalidCredential(msg) => PortfolioError::Credential(msg),
            ConnectorError::Network(msg) | ConnectorError::Timeout(msg) => {
                PortfolioError::Network(msg)
            }
            ConnectorError::ParseError(msg) => PortfolioError::Serialization(msg),
            other => PortfolioError::Exchange(other.to_string()),
        }
    }
}
