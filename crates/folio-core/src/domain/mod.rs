//! 핵심 도메인 모델.

pub mod credential;
pub mod holding;
pub mod snapshot;

pub use credential::Credential;
pub use holding::AggregatedHolding;
pub use snapshot::{CoinPosition, FailureReport, PortfolioSnapshot};
