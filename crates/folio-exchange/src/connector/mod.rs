//! 거래소별 커넥터 구현.

pub mod binance;

pub use binance::{BinanceConfig, BinanceConnector};
