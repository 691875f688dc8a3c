//! 포트폴리오 집계 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - PriceCache: TTL 기반 가격 캐시 (동시 요청 간 공유)
//! - BalanceAggregator: 거래소별 잔고 병합 (부분 실패 허용)
//! - ValuationEngine: 보유 자산 + 가격 → 포트폴리오 지표
//! - SyncJobStore: 백그라운드 동기화 작업 상태 저장소
//! - PortfolioService: 외부 호출자를 위한 파사드

pub mod aggregator;
pub mod jobs;
pub mod price_cache;
pub mod service;
pub mod store;
pub mod valuation;

pub use aggregator::{AggregationOutcome, BalanceAggregator};
pub use jobs::{JobRecord, JobStatus, SyncJobStore};
pub use price_cache::PriceCache;
pub use service::PortfolioService;
pub use store::{CredentialStore, InMemoryCredentialStore};
pub use valuation::ValuationEngine;
