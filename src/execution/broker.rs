use serde_json::Value;
use std::future::Future;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::TradeRequest;
use crate::Result;

/// Broker response to a trade submission
#[derive(Debug, Clone, PartialEq)]
pub struct TradeReceipt {
    id: Option<String>,
    raw: Value,
}

impl TradeReceipt {
    /// Read the acceptance id from a raw broker response
    ///
    /// Only a non-empty `id` (string or number) counts as acceptance.
    pub fn from_response(raw: Value) -> Self {
        let id = match raw.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Self { id, raw }
    }

    pub fn accepted(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::from_response(serde_json::json!({ "id": id }))
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_accepted(&self) -> bool {
        self.id.is_some()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Broker endpoint that places trades
pub trait TradeSink: Send + Sync {
    /// Log in before the first cycle; an error here is fatal
    fn authenticate(&self) -> impl Future<Output = Result<()>> + Send;

    /// Submit one trade; called at most once per cycle and never retried
    fn submit_trade(&self, request: &TradeRequest)
        -> impl Future<Output = Result<TradeReceipt>> + Send;
}

/// Accepts every trade with a generated id and keeps a record of it
#[derive(Default)]
pub struct PaperTradeSink {
    submitted: Mutex<Vec<(String, TradeRequest)>>,
}

impl PaperTradeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trades accepted so far, with their ids
    pub fn submitted(&self) -> Result<Vec<(String, TradeRequest)>> {
        let submitted = self.submitted.lock().map_err(|e| e.to_string())?;
        Ok(submitted.clone())
    }
}

impl TradeSink for PaperTradeSink {
    async fn authenticate(&self) -> Result<()> {
        tracing::info!("Paper trading session opened, no broker credentials needed");
        Ok(())
    }

    async fn submit_trade(&self, request: &TradeRequest) -> Result<TradeReceipt> {
        let id = Uuid::new_v4().to_string();

        tracing::info!(
            trade_id = %id,
            asset = %request.asset,
            direction = %request.direction,
            stake = request.stake,
            expiry_secs = request.expiry_secs,
            account = %request.account_mode,
            "Paper trade accepted"
        );

        self.submitted
            .lock()
            .map_err(|e| e.to_string())?
            .push((id.clone(), request.clone()));

        Ok(TradeReceipt::accepted(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountMode, Direction};
    use serde_json::json;

    fn create_test_request() -> TradeRequest {
        TradeRequest {
            asset: "EURUSD".to_string(),
            direction: Direction::Call,
            stake: 10.0,
            expiry_secs: 60,
            account_mode: AccountMode::Demo,
        }
    }

    #[test]
    fn test_receipt_with_string_id() {
        let receipt = TradeReceipt::from_response(json!({ "id": "123", "status": "open" }));
        assert_eq!(receipt.id(), Some("123"));
        assert!(receipt.is_accepted());
    }

    #[test]
    fn test_receipt_with_numeric_id() {
        let receipt = TradeReceipt::from_response(json!({ "id": 98765 }));
        assert_eq!(receipt.id(), Some("98765"));
    }

    #[test]
    fn test_receipt_without_id_is_rejected() {
        for raw in [json!({}), json!({ "id": "" }), json!({ "id": null }), json!(null)] {
            let receipt = TradeReceipt::from_response(raw.clone());
            assert!(!receipt.is_accepted(), "{} should be rejected", raw);
            assert_eq!(receipt.raw(), &raw);
        }
    }

    #[tokio::test]
    async fn test_paper_sink_accepts_and_records() {
        let sink = PaperTradeSink::new();
        sink.authenticate().await.unwrap();

        let receipt = sink.submit_trade(&create_test_request()).await.unwrap();
        let id = receipt.id().unwrap().to_string();
        assert!(Uuid::parse_str(&id).is_ok());

        let submitted = sink.submitted().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0, id);
        assert_eq!(submitted[0].1, create_test_request());
    }
}
