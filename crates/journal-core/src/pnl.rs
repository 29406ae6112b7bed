//! 선물 계약 승수와 손익 계산.
//!
//! 마이크로 계약(MNQ, MES ...)은 표준 계약(NQ, ES ...)과 별개 항목이며
//! 테이블 순서상 먼저 검사됩니다. 테이블에 없는 종목의 승수는 1입니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::trade::TradeSide;

/// 계약 명세 (포인트당 달러 가치).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractSpec {
    /// 종목 루트 코드 ("MNQ", "ES")
    pub code: &'static str,
    /// 일부 내보내기에서 쓰는 긴 이름
    pub alias: Option<&'static str>,
    pub multiplier: Decimal,
}

const CONTRACTS: &[ContractSpec] = &[
    // Micro
    ContractSpec { code: "MNQ", alias: Some("MICRO NQ"), multiplier: dec!(2) },
    ContractSpec { code: "MES", alias: Some("MICRO ES"), multiplier: dec!(5) },
    ContractSpec { code: "MYM", alias: Some("MICRO YM"), multiplier: dec!(0.5) },
    ContractSpec { code: "M2K", alias: Some("MICRO RTY"), multiplier: dec!(5) },
    ContractSpec { code: "MCL", alias: Some("MICRO CL"), multiplier: dec!(100) },
    ContractSpec { code: "MGC", alias: Some("MICRO GC"), multiplier: dec!(10) },
    // Standard
    ContractSpec { code: "NQ", alias: None, multiplier: dec!(20) },
    ContractSpec { code: "ES", alias: None, multiplier: dec!(50) },
    ContractSpec { code: "YM", alias: None, multiplier: dec!(5) },
    ContractSpec { code: "RTY", alias: None, multiplier: dec!(50) },
    ContractSpec { code: "CL", alias: None, multiplier: dec!(1000) },
    ContractSpec { code: "GC", alias: None, multiplier: dec!(100) },
];

/// 종목 문자열("NQ 03-25", "MNQH5", "MICRO NQ")에 해당하는 계약.
pub fn contract_for(instrument: &str) -> Option<&'static ContractSpec> {
    let upper = instrument.trim().to_uppercase();
    let root = upper.split_whitespace().next().unwrap_or("");

    CONTRACTS.iter().find(|spec| {
        spec.alias.is_some_and(|alias| upper.contains(alias)) || root_matches(root, spec.code)
    })
}

/// 루트가 코드와 같거나, 코드 + 월물 표기(예: "NQH5", "ESZ24")인 경우.
fn root_matches(root: &str, code: &str) -> bool {
    match root.strip_prefix(code) {
        Some("") => true,
        Some(rest) => {
            let mut chars = rest.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.as_str().chars().all(|c| c.is_ascii_digit())
                && !chars.as_str().is_empty()
        }
        None => false,
    }
}

pub fn multiplier_for(instrument: &str) -> Decimal {
    contract_for(instrument).map_or(Decimal::ONE, |spec| spec.multiplier)
}

/// 총손익 (수수료 차감 전).
///
/// 롱: `(exit - entry) * qty * multiplier`, 숏: 부호 반대.
pub fn gross_pnl(
    side: TradeSide,
    entry_price: Decimal,
    exit_price: Decimal,
    quantity: Decimal,
    multiplier: Decimal,
) -> Decimal {
    side.sign() * (exit_price - entry_price) * quantity * multiplier
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_micro_distinct_from_standard() {
        assert_eq!(multiplier_for("NQ 03-25"), dec!(20));
        assert_eq!(multiplier_for("MNQ 03-25"), dec!(2));
        assert_eq!(multiplier_for("ES 03-25"), dec!(50));
        assert_eq!(multiplier_for("MES 03-25"), dec!(5));
        assert_eq!(multiplier_for("MYM 03-25"), dec!(0.5));
        assert_eq!(multiplier_for("RTY 03-25"), dec!(50));
        assert_eq!(multiplier_for("M2K 03-25"), dec!(5));
    }

    #[test]
    fn test_contract_month_codes() {
        assert_eq!(multiplier_for("NQH5"), dec!(20));
        assert_eq!(multiplier_for("MNQZ24"), dec!(2));
        assert_eq!(multiplier_for("CLF5"), dec!(1000));
        // "ESTX" 같은 다른 루트는 ES로 오인하지 않음
        assert_eq!(multiplier_for("ESTX50"), Decimal::ONE);
    }

    #[test]
    fn test_alias_lookup() {
        assert_eq!(multiplier_for("Micro NQ Mar25"), dec!(2));
        assert_eq!(contract_for("micro rty").map(|c| c.code), Some("M2K"));
    }

    #[test]
    fn test_unknown_defaults_to_one() {
        assert_eq!(multiplier_for("AAPL"), Decimal::ONE);
        assert_eq!(multiplier_for(""), Decimal::ONE);
    }

    #[test]
    fn test_pnl_sign() {
        // 롱 100→110, 수량 2, 승수 5
        assert_eq!(
            gross_pnl(TradeSide::Buy, dec!(100), dec!(110), dec!(2), dec!(5)),
            dec!(100)
        );
        // 숏 110→100
        assert_eq!(
            gross_pnl(TradeSide::Sell, dec!(110), dec!(100), dec!(2), dec!(5)),
            dec!(100)
        );
        assert_eq!(
            gross_pnl(TradeSide::Sell, dec!(100), dec!(110), dec!(2), dec!(5)),
            dec!(-100)
        );
    }
}
