//! 로케일별 숫자 파싱.
//!
//! 통화 기호, 공백, 괄호 음수(`$(12.50)`)를 허용합니다.

use std::str::FromStr;

use rust_decimal::Decimal;

/// 소수점 표기.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberLocale {
    /// `1,234.50`
    Dot,
    /// `1.234,50` (스페인어 NinjaTrader)
    Comma,
}

/// 숫자 문자열을 파싱합니다. 비어 있거나 숫자가 아니면 `None`.
pub fn parse_decimal(raw: &str, locale: NumberLocale) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parenthesized = trimmed.contains('(') && trimmed.contains(')');

    let mut cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '$' | '€' | '(' | ')'))
        .collect();

    match locale {
        NumberLocale::Dot => cleaned.retain(|c| c != ','),
        NumberLocale::Comma => {
            cleaned.retain(|c| c != '.');
            cleaned = cleaned.replace(',', ".");
        }
    }

    if cleaned.is_empty() {
        return None;
    }

    let value = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;

    Some(if parenthesized { -value.abs() } else { value })
}
