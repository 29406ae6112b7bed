//! 브로커 액션 어휘 분류.
//!
//! 브로커/로케일마다 다른 액션 문자열("Buy", "Comprar", "BuyToCover" 등)을
//! 닫힌 분류 [`ActionClass`]로 변환합니다.
//!
//! 1. [`ActionVerb::parse`] - 어휘 테이블 정확 일치 (대소문자, 공백, `_`, `-` 무시)
//! 2. [`classify_action`] - 진입/청산 표시(있는 경우)와 결합해 방향 결정
//!
//! 테이블에 없는 문자열은 "buy"로 대체하지 않고 [`CoreError::UnknownAction`]을 반환합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::CoreError, trade::TradeSide};

// =============================================================================
// 액션 동사
// =============================================================================

/// 정규화된 주문 액션 (NinjaTrader OrderAction 의미 체계).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVerb {
    Buy,
    Sell,
    BuyToCover,
    SellShort,
}

/// 로케일별 어휘 테이블. 키는 소문자 + 구분자 제거 형태.
const VOCABULARY: &[(&str, ActionVerb)] = &[
    // English
    ("buy", ActionVerb::Buy),
    ("long", ActionVerb::Buy),
    ("sell", ActionVerb::Sell),
    ("buytocover", ActionVerb::BuyToCover),
    ("cover", ActionVerb::BuyToCover),
    ("sellshort", ActionVerb::SellShort),
    ("short", ActionVerb::SellShort),
    // Español
    ("comprar", ActionVerb::Buy),
    ("vender", ActionVerb::Sell),
    ("comprarparacubrir", ActionVerb::BuyToCover),
    ("venderencorto", ActionVerb::SellShort),
];

impl ActionVerb {
    /// 원시 액션 문자열을 어휘 테이블에서 찾습니다.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let key = normalize_vocabulary(raw);
        VOCABULARY
            .iter()
            .find(|(word, _)| *word == key)
            .map(|(_, verb)| *verb)
            .ok_or_else(|| CoreError::UnknownAction(raw.trim().to_string()))
    }

    /// 체결 방향 (매수 계열 / 매도 계열).
    pub fn side(self) -> TradeSide {
        match self {
            Self::Buy | Self::BuyToCover => TradeSide::Buy,
            Self::Sell | Self::SellShort => TradeSide::Sell,
        }
    }
}

fn normalize_vocabulary(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// 진입/청산 표시
// =============================================================================

/// 포맷이 명시적으로 제공하는 진입/청산 표시 (E/X 컬럼).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryExit {
    Entry,
    Exit,
}

impl EntryExit {
    /// "Entry"/"Exit", "Entrada"/"Salida". 그 외는 `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "entry" | "entrada" => Some(Self::Entry),
            "exit" | "salida" => Some(Self::Exit),
            _ => None,
        }
    }
}

impl fmt::Display for EntryExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => write!(f, "entry"),
            Self::Exit => write!(f, "exit"),
        }
    }
}

// =============================================================================
// 분류 결과
// =============================================================================

/// 체결의 포지션상 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    OpenLong,
    CloseLong,
    OpenShort,
    CloseShort,
}

impl ActionClass {
    pub fn is_entry(self) -> bool {
        matches!(self, Self::OpenLong | Self::OpenShort)
    }

    /// 포지션 방향. 롱이면 `Buy`, 숏이면 `Sell` (진입 레그 방향과 같음).
    pub fn position_side(self) -> TradeSide {
        match self {
            Self::OpenLong | Self::CloseLong => TradeSide::Buy,
            Self::OpenShort | Self::CloseShort => TradeSide::Sell,
        }
    }

    /// 이 청산을 받아줄 수 있는 진입 분류. 진입이면 자기 자신.
    pub fn opening_counterpart(self) -> Self {
        match self {
            Self::CloseLong => Self::OpenLong,
            Self::CloseShort => Self::OpenShort,
            open => open,
        }
    }
}

/// 액션 문자열과 진입/청산 표시로 체결을 분류합니다.
///
/// 표시가 있으면 표시가 진입/청산을 결정하고 동사는 방향만 결정합니다.
/// 표시가 없으면 NinjaTrader 의미 체계를 따릅니다:
/// Buy → OpenLong, Sell → CloseLong, SellShort → OpenShort, BuyToCover → CloseShort.
///
/// # Errors
///
/// - `UnknownAction`: 어휘 테이블에 없는 문자열
/// - `ConflictingAction`: Entry + BuyToCover, Exit + SellShort
pub fn classify_action(raw: &str, marker: Option<EntryExit>) -> Result<ActionClass, CoreError> {
    let verb = ActionVerb::parse(raw)?;

    let class = match (marker, verb) {
        (Some(m @ EntryExit::Entry), ActionVerb::BuyToCover)
        | (Some(m @ EntryExit::Exit), ActionVerb::SellShort) => {
            return Err(CoreError::ConflictingAction {
                action: raw.trim().to_string(),
                marker: m,
            })
        }
        (Some(EntryExit::Entry), verb) => match verb.side() {
            TradeSide::Buy => ActionClass::OpenLong,
            TradeSide::Sell => ActionClass::OpenShort,
        },
        (Some(EntryExit::Exit), verb) => match verb.side() {
            TradeSide::Sell => ActionClass::CloseLong,
            TradeSide::Buy => ActionClass::CloseShort,
        },
        (None, ActionVerb::Buy) => ActionClass::OpenLong,
        (None, ActionVerb::Sell) => ActionClass::CloseLong,
        (None, ActionVerb::SellShort) => ActionClass::OpenShort,
        (None, ActionVerb::BuyToCover) => ActionClass::CloseShort,
    };

    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_vocabulary() {
        assert_eq!(ActionVerb::parse("Buy").unwrap(), ActionVerb::Buy);
        assert_eq!(ActionVerb::parse("SELL").unwrap(), ActionVerb::Sell);
        assert_eq!(ActionVerb::parse("BuyToCover").unwrap(), ActionVerb::BuyToCover);
        assert_eq!(ActionVerb::parse("Buy to cover").unwrap(), ActionVerb::BuyToCover);
        assert_eq!(ActionVerb::parse("Cover").unwrap(), ActionVerb::BuyToCover);
        assert_eq!(ActionVerb::parse("SellShort").unwrap(), ActionVerb::SellShort);
        assert_eq!(ActionVerb::parse("sell_short").unwrap(), ActionVerb::SellShort);
        assert_eq!(ActionVerb::parse("Short").unwrap(), ActionVerb::SellShort);
        assert_eq!(ActionVerb::parse("Long").unwrap(), ActionVerb::Buy);
    }

    #[test]
    fn test_spanish_vocabulary() {
        assert_eq!(ActionVerb::parse("Comprar").unwrap(), ActionVerb::Buy);
        assert_eq!(ActionVerb::parse(" vender ").unwrap(), ActionVerb::Sell);
        assert_eq!(
            ActionVerb::parse("Comprar para cubrir").unwrap(),
            ActionVerb::BuyToCover
        );
        assert_eq!(
            ActionVerb::parse("Vender en corto").unwrap(),
            ActionVerb::SellShort
        );
    }

    #[test]
    fn test_unknown_vocabulary_is_rejected() {
        // 부분 문자열 일치로 추측하지 않음
        assert_eq!(
            ActionVerb::parse("Buying power"),
            Err(CoreError::UnknownAction("Buying power".to_string()))
        );
        assert!(ActionVerb::parse("").is_err());
        assert!(ActionVerb::parse("Kaufen").is_err());
    }

    #[test]
    fn test_classify_with_marker() {
        assert_eq!(
            classify_action("Comprar", Some(EntryExit::Entry)).unwrap(),
            ActionClass::OpenLong
        );
        assert_eq!(
            classify_action("Vender", Some(EntryExit::Entry)).unwrap(),
            ActionClass::OpenShort
        );
        assert_eq!(
            classify_action("Vender", Some(EntryExit::Exit)).unwrap(),
            ActionClass::CloseLong
        );
        assert_eq!(
            classify_action("Comprar", Some(EntryExit::Exit)).unwrap(),
            ActionClass::CloseShort
        );
    }

    #[test]
    fn test_classify_without_marker() {
        assert_eq!(classify_action("Buy", None).unwrap(), ActionClass::OpenLong);
        assert_eq!(classify_action("Sell", None).unwrap(), ActionClass::CloseLong);
        assert_eq!(
            classify_action("SellShort", None).unwrap(),
            ActionClass::OpenShort
        );
        assert_eq!(
            classify_action("BuyToCover", None).unwrap(),
            ActionClass::CloseShort
        );
    }

    #[test]
    fn test_conflicting_marker() {
        assert!(matches!(
            classify_action("BuyToCover", Some(EntryExit::Entry)),
            Err(CoreError::ConflictingAction { .. })
        ));
        assert!(matches!(
            classify_action("SellShort", Some(EntryExit::Exit)),
            Err(CoreError::ConflictingAction { .. })
        ));
    }

    #[test]
    fn test_marker_parse() {
        assert_eq!(EntryExit::parse("Entrada"), Some(EntryExit::Entry));
        assert_eq!(EntryExit::parse("Salida"), Some(EntryExit::Exit));
        assert_eq!(EntryExit::parse(" Exit "), Some(EntryExit::Exit));
        assert_eq!(EntryExit::parse(""), None);
        assert_eq!(EntryExit::parse("-"), None);
    }

    #[test]
    fn test_opening_counterpart() {
        assert_eq!(
            ActionClass::CloseLong.opening_counterpart(),
            ActionClass::OpenLong
        );
        assert_eq!(
            ActionClass::CloseShort.opening_counterpart(),
            ActionClass::OpenShort
        );
        assert_eq!(ActionClass::CloseShort.position_side(), TradeSide::Sell);
    }
}
