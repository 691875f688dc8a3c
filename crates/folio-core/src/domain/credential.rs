//! 거래소 자격증명 모델.
//!
//! 자격증명은 요청 단위로 생성/복호화되어 사용 후 폐기됩니다.
//! 시크릿은 `SecretString`으로 보관되어 로그나 Debug 출력에 노출되지 않습니다.

use secrecy::SecretString;
use std::fmt;
use uuid::Uuid;

/// 거래소 API 자격증명.
///
/// # 보안
/// - `Debug` 구현은 민감 정보(`api_key`, `api_secret`)를 마스킹합니다.
/// - `Serialize`를 구현하지 않으므로 외부로 직렬화될 수 없습니다.
#[derive(Clone)]
pub struct Credential {
    /// 자격증명 식별자
    pub id: Uuid,
    /// 소유 사용자 식별자
    pub user_id: Uuid,
    /// 거래소 표시 이름 (예: "Binance")
    pub exchange: String,
    /// API 키 (요청 헤더로 전달)
    pub api_key: String,
    /// API 시크릿 (서명 키, 저장소에서 just-in-time 복호화됨)
    pub api_secret: SecretString,
}

impl Credential {
    /// 새 자격증명 생성.
    pub fn new(
        user_id: Uuid,
        exchange: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            exchange: exchange.into(),
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked_key = if self.api_key.len() > 8 {
            format!(
                "{}...{}",
                &self.api_key[..4],
                &self.api_key[self.api_key.len() - 4..]
            )
        } else {
            "***REDACTED***".to_string()
        };

        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("exchange", &self.exchange)
            .field("api_key", &masked_key)
            .field("api_secret", &"***REDACTED***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_debug_masks_key_material() {
        let credential = Credential::new(
            Uuid::new_v4(),
            "Binance",
            "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zv",
            "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP",
        );

        let debug = format!("{:?}", credential);
        assert!(!debug.contains("NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP"));
        assert!(!debug.contains("vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zv"));
        assert!(debug.contains("vmPU...E2zv"));
    }

    #[test]
    fn test_short_key_fully_masked() {
        let credential = Credential::new(Uuid::new_v4(), "Binance", "short", "secret");

        let debug = format!("{:?}", credential);
        assert!(!debug.contains("short"));
        assert!(debug.contains("***REDACTED***"));
    }

    #[test]
    fn test_secret_accessible_for_signing() {
        let credential = Credential::new(Uuid::new_v4(), "Binance", "key", "abc123");
        assert_eq!(credential.api_secret.expose_secret(), "abc123");
    }
}
