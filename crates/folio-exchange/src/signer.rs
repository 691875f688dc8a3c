//! HMAC-SHA256 요청 서명.
//!
//! 거래소 인증 요청의 쿼리 문자열을 API 시크릿으로 서명합니다.
//! 서명은 결정적이므로 동일 입력에 대한 재시도 요청이 멱등하게
//! 동일한 서명을 갖습니다.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{ConnectorError, ConnectorResult};

type HmacSha256 = Hmac<Sha256>;

/// 정규 쿼리 문자열을 HMAC-SHA256으로 서명합니다.
///
/// 시크릿의 raw 바이트를 키로 사용하며, 다이제스트를 소문자 16진수로
/// 렌더링합니다. 요청을 만들 때 사용한 파라미터 순서 그대로의 쿼리
/// 문자열(`canonical_query` 출력)을 전달해야 합니다.
///
/// # Errors
/// 시크릿이 비어 있으면 `ConnectorError::InvalidCredential`을 반환합니다.
pub fn sign(canonical_query: &str, secret: &str) -> ConnectorResult<String> {
    if secret.is_empty() {
        return Err(ConnectorError::InvalidCredential(
            "empty API secret".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ConnectorError::InvalidCredential(e.to_string()))?;
    mac.update(canonical_query.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// 파라미터 목록에서 정규 쿼리 문자열 생성.
///
/// 파라미터를 요청의 리터럴 순서 그대로 `&`로 연결합니다. 이 문자열이
/// 요청 본문과 서명 계산 양쪽에 동일하게 사용됩니다.
pub fn canonical_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_deterministic() {
        let a = sign("timestamp=1000", "abc123").unwrap();
        let b = sign("timestamp=1000", "abc123").unwrap();

        assert_eq!(a, b);
        assert_eq!(
            a,
            "b7396ef607c4256055beebb280a392451fb6dddaebcf23325a2b13eb795e9dd4"
        );
    }

    #[test]
    fn test_sign_sensitive_to_inputs() {
        let base = sign("timestamp=1000", "abc123").unwrap();

        // 쿼리가 바뀌면 서명도 바뀜
        assert_eq!(
            sign("timestamp=1001", "abc123").unwrap(),
            "16a98b54c4afb62696122a3b7fc2ba78066904c25a494bb76edab11475dcab66"
        );
        assert_ne!(sign("timestamp=1001", "abc123").unwrap(), base);

        // 시크릿이 바뀌어도 서명이 바뀜
        assert_eq!(
            sign("timestamp=1000", "abc124").unwrap(),
            "d098f1388ab6416983ddde380877815dbe10f16fec2c3b3f4f1978da11fdbf6c"
        );
    }

    #[test]
    fn test_sign_binance_reference_vector() {
        // Binance API 문서의 공식 서명 예제
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

        assert_eq!(
            sign(query, secret).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = sign("timestamp=1000", "");
        assert!(matches!(result, Err(ConnectorError::InvalidCredential(_))));
    }

    #[test]
    fn test_canonical_query_preserves_order() {
        let params = [
            ("timestamp", "1000".to_string()),
            ("recvWindow", "5000".to_string()),
        ];
        assert_eq!(canonical_query(&params), "timestamp=1000&recvWindow=5000");
        assert_eq!(canonical_query(&[]), "");
    }
}
