//! 비동기 동기화 작업 추적.
//!
//! 거래소 동기화는 요청과 분리된 백그라운드 태스크로 실행되고,
//! 호출자는 작업 ID로 진행 상태를 조회합니다. 저장소는 프로세스
//! 메모리에만 존재하며 재시작 시 초기화됩니다.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// 동기화 작업의 수명주기 상태.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 대기열에 등록됨
    Queued,
    /// 실행 중
    Running,
    /// 정상 완료
    Completed,
    /// 실패 (원인 메시지 포함)
    Failed { error: String },
}

/// 단일 동기화 작업 기록.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: Uuid,
    pub exchange: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 메모리 기반 작업 저장소.
#[derive(Debug, Default, Clone)]
pub struct SyncJobStore {
    jobs: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl SyncJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 작업을 `Queued` 상태로 등록하고 ID를 반환합니다.
    pub async fn enqueue(&self, exchange: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let record = JobRecord {
            id,
            exchange: exchange.to_string(),
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
        };

        self.jobs.write().await.insert(id, record);
        debug!(job_id = %id, exchange = %exchange, "Sync job enqueued");
        id
    }

    /// 작업 상태 전이. 없는 ID는 무시됩니다.
    pub async fn transition(&self, id: Uuid, status: JobStatus) {
        let mut jobs = self.jobs.write().await;
        if let Some(record) = jobs.get_mut(&id) {
            debug!(job_id = %id, status = ?status, "Sync job transition");
            record.status = status;
            record.updated_at = Utc::now();
        }
    }

    /// 작업 조회.
    pub async fn get(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// 등록된 작업 수.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
