//! 거래소 이름 → 커넥터 레지스트리.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::traits::ExchangeConnector;

/// 거래소 표시 이름으로 커넥터를 해석하는 레지스트리.
///
/// 조회는 대소문자를 구분하지 않습니다. 알 수 없는 거래소는 에러가 아닌
/// `None`으로 반환되어, 집계기가 해당 자격증명을 조용히 건너뛸 수
/// 있습니다.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn ExchangeConnector>>,
}

impl ConnectorRegistry {
    /// 빈 레지스트리 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 커넥터 등록.
    ///
    /// 커넥터의 `name()`을 소문자로 정규화해 키로 사용합니다. 같은
    /// 이름으로 다시 등록하면 기존 커넥터를 교체합니다.
    pub fn register(&mut self, connector: Arc<dyn ExchangeConnector>) {
        let key = connector.name().to_lowercase();
        debug!(exchange = %key, "Registering exchange connector");
        self.connectors.insert(key, connector);
    }

    /// 거래소 이름으로 커넥터 해석 (대소문자 무시).
    pub fn resolve(&self, exchange: &str) -> Option<Arc<dyn ExchangeConnector>> {
        self.connectors.get(&exchange.to_lowercase()).cloned()
    }

    /// 등록된 거래소 이름 목록.
    pub fn names(&self) -> Vec<String> {
        self.connectors.keys().cloned().collect()
    }

    /// 등록된 커넥터 수.
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// 레지스트리가 비어 있는지 확인.
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedConnector;

    #[test]
    fn test_resolve_case_insensitive() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(SimulatedConnector::new()));

        assert!(registry.resolve("simulated").is_some());
        assert!(registry.resolve("Simulated").is_some());
        assert!(registry.resolve("SIMULATED").is_some());
    }

    #[test]
    fn test_unknown_exchange_is_none() {
        let registry = ConnectorRegistry::new();
        assert!(registry.resolve("kraken").is_none());
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(SimulatedConnector::new()));
        registry.register(Arc::new(SimulatedConnector::new()));

        assert_eq!(registry.len(), 1);
    }
}
