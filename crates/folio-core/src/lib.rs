//! # Folio Core
//!
//! 포트폴리오 통합 시스템의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 거래소 자격증명 모델
//! - 통합 보유 자산 및 포트폴리오 스냅샷 DTO
//! - 설정 관리
//! - 로깅 인프라
//! - 자격증명 암호화

pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use crypto::{CredentialEncryptor, CryptoError};
pub use domain::*;
pub use error::*;
pub use logging::*;
