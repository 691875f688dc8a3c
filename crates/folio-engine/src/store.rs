//! 자격증명 저장소.
//!
//! 시크릿은 저장 시 AES-256-GCM으로 봉인되고, 조회 시점에만
//! 복호화되어 `Credential`로 재구성됩니다. 복호화된 시크릿은
//! 요청 처리 동안만 메모리에 존재합니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use folio_core::{Credential, CredentialEncryptor, PortfolioError, PortfolioResult};

/// 자격증명 조회/등록 추상화.
///
/// 영속 계층 교체(DB 도입 등)를 염두에 둔 경계입니다.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 사용자의 모든 자격증명을 복호화된 형태로 반환합니다.
    async fn list_credentials(&self, user_id: Uuid) -> PortfolioResult<Vec<Credential>>;

    /// 자격증명을 봉인해 저장하고 발급된 ID를 반환합니다.
    async fn save_credential(
        &self,
        user_id: Uuid,
        exchange: &str,
        api_key: &str,
        api_secret: &str,
    ) -> PortfolioResult<Uuid>;

    /// 자격증명 삭제. 없는 ID는 `NotFound`.
    async fn delete_credential(&self, user_id: Uuid, id: Uuid) -> PortfolioResult<()>;
}

/// 봉인된 저장 행. 시크릿은 base64(nonce || ciphertext) 문자열.
#[derive(Debug, Clone)]
struct SealedRow {
    id: Uuid,
    user_id: Uuid,
    exchange: String,
    api_key: String,
    sealed_secret: String,
    created_at: DateTime<Utc>,
}

/// 메모리 기반 자격증명 저장소.
pub struct InMemoryCredentialStore {
    encryptor: CredentialEncryptor,
    rows: Arc<RwLock<HashMap<Uuid, SealedRow>>>,
}

impl InMemoryCredentialStore {
    pub fn new(encryptor: CredentialEncryptor) -> Self {
        Self {
            encryptor,
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn list_credentials(&self, user_id: Uuid) -> PortfolioResult<Vec<Credential>> {
        let rows = self.rows.read().await;

        let mut credentials = Vec::new();
        for row in rows.values().filter(|r| r.user_id == user_id) {
            // just-in-time 복호화
            let secret = self.encryptor.open(&row.sealed_secret)?;
            credentials.push(Credential {
                id: row.id,
                user_id: row.user_id,
                exchange: row.exchange.clone(),
                api_key: row.api_key.clone(),
                api_secret: secret.into(),
            });
        }

        // 등록 순서대로 반환
        credentials.sort_by_key(|c| {
            rows.get(&c.id)
                .map(|r| r.created_at)
                .unwrap_or_else(Utc::now)
        });

        debug!(user_id = %user_id, count = credentials.len(), "Credentials loaded");
        Ok(credentials)
    }

    async fn save_credential(
        &self,
        user_id: Uuid,
        exchange: &str,
        api_key: &str,
        api_secret: &str,
    ) -> PortfolioResult<Uuid> {
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(PortfolioError::Credential(
                "API 키와 시크릿은 비어 있을 수 없습니다".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let row = SealedRow {
            id,
            user_id,
            exchange: exchange.to_string(),
            api_key: api_key.to_string(),
            sealed_secret: self.encryptor.seal(api_secret)?,
            created_at: Utc::now(),
        };

        self.rows.write().await.insert(id, row);
        debug!(credential_id = %id, exchange = %exchange, "Credential stored");
        Ok(id)
    }

    async fn delete_credential(&self, user_id: Uuid, id: Uuid) -> PortfolioResult<()> {
        let mut rows = self.rows.write().await;
        match rows.get(&id) {
            Some(row) if row.user_id == user_id => {
                rows.remove(&id);
                Ok(())
            }
            _ => Err(PortfolioError::NotFound(format!("자격증명 {id}"))),
        }
    }
}
