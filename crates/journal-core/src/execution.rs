//! 브로커 체결 레코드.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    action::{classify_action, ActionClass, EntryExit},
    error::CoreError,
};

/// 단일 체결 (fill). 파서가 만들고 페어링이 소비합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExecution {
    pub account: String,
    pub instrument: String,
    /// 브로커 원문 액션 ("Comprar", "BuyToCover" 등)
    pub action: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    /// 포맷이 제공하는 진입/청산 표시
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_exit: Option<EntryExit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<String>,
}

impl RawExecution {
    pub fn new(
        account: impl Into<String>,
        instrument: impl Into<String>,
        action: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
        time: DateTime<Utc>,
    ) -> Self {
        Self {
            account: account.into(),
            instrument: instrument.into(),
            action: action.into(),
            quantity,
            price,
            time,
            commission: Decimal::ZERO,
            fee: Decimal::ZERO,
            entry_exit: None,
            order_id: None,
            execution_id: None,
            order_type: None,
        }
    }

    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_marker(mut self, marker: EntryExit) -> Self {
        self.entry_exit = Some(marker);
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_execution_id(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    pub fn with_order_type(mut self, order_type: impl Into<String>) -> Self {
        self.order_type = Some(order_type.into());
        self
    }

    /// 이 체결에 귀속되는 비용 (수수료 + 요금).
    pub fn costs(&self) -> Decimal {
        self.commission + self.fee
    }

    pub fn classify(&self) -> Result<ActionClass, CoreError> {
        classify_action(&self.action, self.entry_exit)
    }

    /// 브로커가 체결 ID를 제공했는지.
    pub fn has_execution_id(&self) -> bool {
        self.execution_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }

    /// 거래 ID 구성용 식별자. 체결 ID가 없으면 내용 fingerprint.
    ///
    /// fingerprint는 내용이 같은 체결끼리 겹칩니다. 페이로드 단위의 구분은
    /// 짝짓기 단계에서 합니다.
    pub fn identity(&self) -> String {
        match self.execution_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => self.fingerprint(),
        }
    }

    /// (account, instrument, action, time, price, quantity, orderId) 의 fingerprint.
    pub fn fingerprint(&self) -> String {
        let time = self.time.to_rfc3339();
        let price = self.price.normalize().to_string();
        let quantity = self.quantity.normalize().to_string();
        fingerprint(&[
            &self.account,
            &self.instrument,
            &self.action,
            &time,
            &price,
            &quantity,
            self.order_id.as_deref().unwrap_or(""),
        ])
    }
}

/// 필드 목록의 SHA-256 앞 16자리 (hex).
///
/// 필드는 `|`로 구분되므로 `["ab", "c"]`와 `["a", "bc"]`는 다른 값이 됩니다.
pub fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(part.trim().as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    fn fill() -> RawExecution {
        RawExecution::new(
            "Sim101",
            "NQ 03-25",
            "Comprar",
            dec!(1),
            dec!(21000.25),
            Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fill().fingerprint(), fill().fingerprint());
        assert_eq!(fill().fingerprint().len(), 16);
    }

    #[test]
    fn test_fingerprint_ignores_decimal_scale() {
        let mut other = fill();
        other.price = dec!(21000.2500);
        assert_eq!(fill().fingerprint(), other.fingerprint());
    }

    #[test]
    fn test_fingerprint_field_boundaries() {
        assert_ne!(fingerprint(&["ab", "c"]), fingerprint(&["a", "bc"]));
    }

    #[test]
    fn test_identity_prefers_execution_id() {
        assert_eq!(fill().with_execution_id("abc123").identity(), "abc123");
        assert_eq!(fill().with_execution_id("  ").identity(), fill().fingerprint());
        assert!(fill().with_execution_id("abc123").has_execution_id());
        assert!(!fill().with_execution_id("  ").has_execution_id());
        assert!(!fill().has_execution_id());
    }

    #[test]
    fn test_costs() {
        let f = fill().with_commission(dec!(2.5)).with_fee(dec!(0.5));
        assert_eq!(f.costs(), dec!(3.0));
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "account": "A1", "instrument": "ES 03-25", "action": "Buy",
            "quantity": 2, "price": 5000.5, "time": "2025-01-06T14:30:00Z"
        }"#;
        let f: RawExecution = serde_json::from_str(json).unwrap();
        assert_eq!(f.fee, Decimal::ZERO);
        assert!(f.entry_exit.is_none());
        assert_eq!(f.classify().unwrap(), ActionClass::OpenLong);
    }
}
