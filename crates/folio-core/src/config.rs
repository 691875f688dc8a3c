//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 가격 캐시 설정
    #[serde(default)]
    pub price_cache: PriceCacheConfig,
    /// 재시도 설정
    #[serde(default)]
    pub retry: RetrySettings,
    /// 시장 데이터 설정
    #[serde(default)]
    pub market_data: MarketDataConfig,
    /// 거래소 설정
    #[serde(default)]
    pub exchanges: HashMap<String, ExchangeConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            price_cache: PriceCacheConfig::default(),
            retry: RetrySettings::default(),
            market_data: MarketDataConfig::default(),
            exchanges: HashMap::new(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 가격 캐시 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceCacheConfig {
    /// 캐시 TTL (초)
    pub ttl_secs: u64,
}

impl Default for PriceCacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 }
    }
}

/// 재시도 설정.
///
/// 지수 백오프: `initial_backoff_ms * 2^(attempt-1)` 대기 후 재시도.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    /// 최대 시도 횟수
    pub max_attempts: u32,
    /// 초기 백오프 (밀리초)
    pub initial_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
        }
    }
}

/// 시장 데이터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketDataConfig {
    /// 가격/24시간 변동률 조회에 사용할 거래소 이름
    pub exchange: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            exchange: "binance".to_string(),
        }
    }
}

/// 거래소별 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExchangeConfig {
    /// 테스트넷 사용 여부
    #[serde(default)]
    pub testnet: bool,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("price_cache.ttl_secs", 30)?
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.initial_backoff_ms", 1000)?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("FOLIO")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
