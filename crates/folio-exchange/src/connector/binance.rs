//! Binance 거래소 커넥터.
//!
//! Binance Spot REST API 연동 구현. 메인넷과 테스트넷 모두 지원.
//!
//! 인증 요청의 와이어 계약: API 키는 `X-MBX-APIKEY` 헤더로 전달하고,
//! 쿼리 문자열에 밀리초 Unix `timestamp` 파라미터와, 나머지 파라미터들을
//! 리터럴 순서 그대로 HMAC-SHA256 서명한 `signature` 파라미터를 포함합니다.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{ConnectorError, ConnectorResult};
use crate::retry::{with_retry, RetryConfig};
use crate::signer;
use crate::traits::{Balance, ConnectionCheck, ExchangeConnector};
use folio_core::Credential;

/// 레지스트리에 등록되는 거래소 표시 이름.
const EXCHANGE_NAME: &str = "binance";

// ============================================================================
// 설정
// ============================================================================

/// Binance 커넥터 설정.
///
/// 자격증명은 요청 단위로 전달되므로 설정에는 키 재료가 없습니다.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// 테스트넷 사용
    pub testnet: bool,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 수신 윈도우 (밀리초)
    pub recv_window: u64,
    /// REST 기본 URL 오버라이드 (테스트용)
    pub base_url: Option<String>,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            testnet: false,
            timeout_secs: 30,
            recv_window: 5000,
            base_url: None,
        }
    }
}

impl BinanceConfig {
    /// 테스트넷 사용.
    pub fn with_testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// REST 기본 URL을 오버라이드합니다 (mock 서버 테스트용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// 거래소별 애플리케이션 설정에서 생성.
    pub fn from_exchange_config(config: &folio_core::ExchangeConfig) -> Self {
        Self {
            testnet: config.testnet,
            timeout_secs: config.timeout_secs,
            ..Default::default()
        }
    }

    /// REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &str {
        if let Some(base) = &self.base_url {
            return base;
        }
        if self.testnet {
            "https://testnet.binance.vision"
        } else {
            "https://api.binance.com"
        }
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceAccountBalance {
    asset: String,
    free: String,
    locked: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceAccountInfo {
    balances: Vec<BinanceAccountBalance>,
    #[serde(default)]
    account_type: Option<String>,
    #[serde(default)]
    can_trade: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTickerPrice {
    symbol: String,
    price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker24h {
    symbol: String,
    price_change_percent: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceApiError {
    code: i32,
    msg: String,
}

// ============================================================================
// Binance 커넥터
// ============================================================================

/// Binance 거래소 커넥터.
pub struct BinanceConnector {
    config: BinanceConfig,
    client: Client,
    retry: RetryConfig,
    cancel: CancellationToken,
}

impl BinanceConnector {
    /// 새 Binance 커넥터 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ConnectorError::Network`를 반환합니다.
    pub fn new(
        config: BinanceConfig,
        retry: RetryConfig,
        cancel: CancellationToken,
    ) -> ConnectorResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConnectorError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            retry,
            cancel,
        })
    }

    /// 현재 타임스탬프(밀리초) 반환.
    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// 자산 심볼을 Binance USDT 마켓 페어로 변환 (예: "BTC" -> "BTCUSDT").
    fn usdt_pair(asset: &str) -> String {
        format!("{}USDT", asset)
    }

    /// 공개 API 요청 (인증 불필요).
    async fn public_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
    ) -> ConnectorResult<T> {
        let url = format!("{}{}", self.config.rest_base_url(), endpoint);

        debug!("GET {}", endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ConnectorError::from)?;

        self.handle_response(response).await
    }

    /// 서명된 API 요청 (인증 필요).
    ///
    /// 타임스탬프와 서명은 시도마다 새로 계산됩니다. 서명 자체는
    /// 결정적이므로 같은 쿼리의 재시도는 같은 서명을 갖습니다.
    async fn signed_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        credential: &Credential,
    ) -> ConnectorResult<T> {
        let url = format!("{}{}", self.config.rest_base_url(), endpoint);

        let mut all_params = params.to_vec();
        all_params.push(("timestamp", Self::timestamp_ms().to_string()));
        all_params.push(("recvWindow", self.config.recv_window.to_string()));

        let query = signer::canonical_query(&all_params);
        let signature = signer::sign(&query, credential.api_secret.expose_secret())?;
        let full_url = format!("{}?{}&signature={}", url, query, signature);

        debug!("GET (signed) {}", endpoint);

        let response = self
            .client
            .get(&full_url)
            .header("X-MBX-APIKEY", &credential.api_key)
            .send()
            .await
            .map_err(ConnectorError::from)?;

        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> ConnectorResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ConnectorError::Network(e.to_string()))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                ConnectorError::ParseError(e.to_string())
            })
        } else if let Ok(api_error) = serde_json::from_str::<BinanceApiError>(&body) {
            Err(Self::map_error_code(api_error.code, &api_error.msg))
        } else {
            match status.as_u16() {
                401 | 403 => Err(ConnectorError::Unauthorized(body)),
                418 | 429 => Err(ConnectorError::RateLimited),
                code => Err(ConnectorError::ApiError {
                    code: code as i32,
                    message: body,
                }),
            }
        }
    }

    /// Binance 에러 코드를 ConnectorError로 매핑.
    fn map_error_code(code: i32, msg: &str) -> ConnectorError {
        match code {
            -1001 => ConnectorError::Network(msg.to_string()),
            -1002 | -2014 | -2015 => ConnectorError::Unauthorized(msg.to_string()),
            -1003 => ConnectorError::RateLimited,
            -1021 => ConnectorError::Timeout(msg.to_string()),
            _ => ConnectorError::ApiError {
                code,
                message: msg.to_string(),
            },
        }
    }

    /// 계좌 정보 조회 (단일 시도).
    async fn account_info(&self, credential: &Credential) -> ConnectorResult<BinanceAccountInfo> {
        self.signed_get("/api/v3/account", &[], credential).await
    }

    /// 잔고 스냅샷 조회 (단일 시도).
    async fn account_balances(
        &self,
        credential: &Credential,
    ) -> ConnectorResult<HashMap<String, Balance>> {
        let account = self.account_info(credential).await?;

        let mut balances = HashMap::new();
        for entry in account.balances {
            let free: Decimal = entry.free.parse().unwrap_or(Decimal::ZERO);
            let locked: Decimal = entry.locked.parse().unwrap_or(Decimal::ZERO);

            if free > Decimal::ZERO || locked > Decimal::ZERO {
                let asset = entry.asset.to_uppercase();
                balances.insert(
                    asset.clone(),
                    Balance {
                        asset,
                        free,
                        locked,
                    },
                );
            }
        }

        Ok(balances)
    }

    /// 요청 심볼들의 USDT 가격 조회 (단일 시도).
    async fn ticker_prices(
        &self,
        symbols: &BTreeSet<String>,
    ) -> ConnectorResult<HashMap<String, Decimal>> {
        let tickers: Vec<BinanceTickerPrice> = self.public_get("/api/v3/ticker/price").await?;

        let by_pair: HashMap<String, Decimal> = tickers
            .into_iter()
            .filter_map(|t| t.price.parse().ok().map(|p| (t.symbol, p)))
            .collect();

        let mut prices = HashMap::new();
        for symbol in symbols {
            // USDT는 기축 통화이므로 1 USD로 평가
            if symbol == "USDT" {
                prices.insert(symbol.clone(), Decimal::ONE);
                continue;
            }
            // 거래소가 상장하지 않은 페어는 생략 (에러 아님)
            if let Some(price) = by_pair.get(&Self::usdt_pair(symbol)) {
                if *price > Decimal::ZERO {
                    prices.insert(symbol.clone(), *price);
                }
            }
        }

        Ok(prices)
    }

    /// 요청 심볼들의 24시간 변동률 조회 (단일 시도).
    async fn ticker_24h_changes(
        &self,
        symbols: &BTreeSet<String>,
    ) -> ConnectorResult<HashMap<String, Decimal>> {
        let tickers: Vec<BinanceTicker24h> = self.public_get("/api/v3/ticker/24hr").await?;

        let by_pair: HashMap<String, Decimal> = tickers
            .into_iter()
            .filter_map(|t| {
                t.price_change_percent
                    .parse()
                    .ok()
                    .map(|pct| (t.symbol, pct))
            })
            .collect();

        let mut changes = HashMap::new();
        for symbol in symbols {
            if let Some(pct) = by_pair.get(&Self::usdt_pair(symbol)) {
                changes.insert(symbol.clone(), *pct);
            }
        }

        Ok(changes)
    }
}

#[async_trait]
impl ExchangeConnector for BinanceConnector {
    fn name(&self) -> &str {
        EXCHANGE_NAME
    }

    async fn fetch_balances(
        &self,
        credential: &Credential,
    ) -> ConnectorResult<HashMap<String, Balance>> {
        with_retry(EXCHANGE_NAME, &self.retry, &self.cancel, || {
            self.account_balances(credential)
        })
        .await
    }

    async fn fetch_prices(
        &self,
        symbols: &BTreeSet<String>,
    ) -> ConnectorResult<HashMap<String, Decimal>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        with_retry(EXCHANGE_NAME, &self.retry, &self.cancel, || {
            self.ticker_prices(symbols)
        })
        .await
    }

    async fn fetch_24h_change(
        &self,
        symbols: &BTreeSet<String>,
    ) -> ConnectorResult<HashMap<String, Decimal>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        with_retry(EXCHANGE_NAME, &self.retry, &self.cancel, || {
            self.ticker_24h_changes(symbols)
        })
        .await
    }

    async fn test_connection(&self, credential: &Credential) -> ConnectorResult<ConnectionCheck> {
        let account = with_retry(EXCHANGE_NAME, &self.retry, &self.cancel, || {
            self.account_info(credential)
        })
        .await?;

        Ok(ConnectionCheck {
            account_type: account.account_type,
            can_trade: account.can_trade,
        })
    }
}
