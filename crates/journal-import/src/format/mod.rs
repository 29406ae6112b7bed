//! 내보내기 포맷 판별과 파서.
//!
//! 포맷은 닫힌 열거형 [`ImportFormat`]이며 각 변형은 [`ExportParser`]를 구현합니다.
//! 판별기는 첫 줄(헤더)의 구조적 특징을 [`ImportFormat::ALL`] 순서로 검사하고
//! 처음 일치한 포맷을 고릅니다. 아무것도 일치하지 않으면 영어 체결 파서로
//! 최선 시도하며 신뢰도는 [`Confidence::Fallback`]입니다.

mod fills;
mod ninja_executions_en;
mod ninja_executions_es;
mod ninja_trades_es;
mod ninja_xml;
mod tabular;
mod tradovate;

use std::fmt;

use chrono_tz::Tz;
use journal_core::{NormalizedTrade, RawExecution};
use serde::{Deserialize, Serialize};

use crate::{error::ImportError, pairing::PairingStrategy};

pub use ninja_executions_en::NinjaExecutionsEnParser;
pub use ninja_executions_es::NinjaExecutionsEsParser;
pub use ninja_trades_es::NinjaTradesEsParser;
pub use ninja_xml::NinjaXmlParser;
pub use tradovate::TradovateParser;

// =============================================================================
// 포맷 열거형
// =============================================================================

/// 지원하는 브로커 내보내기 포맷.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportFormat {
    /// NinjaTrader 체결 XML (`<Execution>` 요소)
    NinjaTraderXml,
    /// Tradovate Position History CSV (짝지어진 거래)
    TradovatePositionHistory,
    /// NinjaTrader 스페인어 거래 그리드 (`;`, 쉼표 소수점)
    NinjaTraderTradesEs,
    /// NinjaTrader 스페인어 체결 (`;`, E/X 컬럼)
    NinjaTraderExecutionsEs,
    /// NinjaTrader 영어 체결 CSV. 판별 실패 시 대체 파서
    NinjaTraderExecutionsEn,
}

impl ImportFormat {
    /// 판별 순서. 스페인어 헤더 "Instrumento"가 "Instrument"를 포함하므로
    /// 영어 체결 포맷은 마지막이어야 합니다.
    pub const ALL: [ImportFormat; 5] = [
        ImportFormat::NinjaTraderXml,
        ImportFormat::TradovatePositionHistory,
        ImportFormat::NinjaTraderTradesEs,
        ImportFormat::NinjaTraderExecutionsEs,
        ImportFormat::NinjaTraderExecutionsEn,
    ];

    pub const FALLBACK: ImportFormat = ImportFormat::NinjaTraderExecutionsEn;

    /// 거래/계좌에 기록할 플랫폼 이름.
    pub fn platform(self) -> &'static str {
        match self {
            Self::TradovatePositionHistory => "tradovate",
            _ => "ninjatrader",
        }
    }

    pub fn parser(self) -> &'static dyn ExportParser {
        match self {
            Self::NinjaTraderXml => &NinjaXmlParser,
            Self::TradovatePositionHistory => &TradovateParser,
            Self::NinjaTraderTradesEs => &NinjaTradesEsParser,
            Self::NinjaTraderExecutionsEs => &NinjaExecutionsEsParser,
            Self::NinjaTraderExecutionsEn => &NinjaExecutionsEnParser,
        }
    }

    pub fn parse(self, text: &str, ctx: &ParseContext) -> Result<ParsedBatch, ImportError> {
        self.parser().parse(text, ctx)
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NinjaTraderXml => "NinjaTrader XML",
            Self::TradovatePositionHistory => "Tradovate Position History",
            Self::NinjaTraderTradesEs => "NinjaTrader trades (es)",
            Self::NinjaTraderExecutionsEs => "NinjaTrader executions (es)",
            Self::NinjaTraderExecutionsEn => "NinjaTrader executions (en)",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// 판별
// =============================================================================

/// 판별 신뢰도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Confidence {
    /// 포맷 고유 특징이 일치함
    Hallmark,
    /// 일치하는 포맷이 없어 대체 파서로 최선 시도
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub format: ImportFormat,
    pub confidence: Confidence,
}

/// 원문의 포맷을 판별합니다.
pub fn detect(text: &str) -> Detection {
    let sample = Sample::new(text);

    ImportFormat::ALL
        .iter()
        .find(|format| format.parser().matches(&sample))
        .map(|&format| Detection {
            format,
            confidence: Confidence::Hallmark,
        })
        .unwrap_or(Detection {
            format: ImportFormat::FALLBACK,
            confidence: Confidence::Fallback,
        })
}

/// 판별기에 넘기는 원문 요약.
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    /// BOM/앞 공백을 제거한 전체 원문
    pub text: &'a str,
    /// 첫 번째 비어 있지 않은 줄
    pub first_line: &'a str,
}

impl<'a> Sample<'a> {
    pub fn new(text: &'a str) -> Self {
        let text = strip_bom(text).trim_start();
        let first_line = text
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim();
        Self { text, first_line }
    }

    pub fn header_has_all(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.first_line.contains(name))
    }
}

pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

// =============================================================================
// 파서 결과
// =============================================================================

/// 파싱 설정.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    /// 오프셋 없는 타임스탬프의 시간대
    pub timezone: Tz,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

/// 필수 필드 누락 등으로 제외된 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    /// 1부터 시작하는 원문 줄 번호 (XML은 요소 순번)
    pub line: usize,
    pub reason: String,
}

impl SkippedRecord {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// 파서가 만든 레코드.
#[derive(Debug, Clone)]
pub enum ParsedRecords {
    /// 짝짓기가 필요한 체결
    Executions {
        executions: Vec<RawExecution>,
        strategy: PairingStrategy,
    },
    /// 브로커가 이미 짝지은 거래
    Trades(Vec<NormalizedTrade>),
}

impl ParsedRecords {
    pub fn len(&self) -> usize {
        match self {
            Self::Executions { executions, .. } => executions.len(),
            Self::Trades(trades) => trades.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct ParsedBatch {
    pub format: ImportFormat,
    pub records: ParsedRecords,
    pub skipped: Vec<SkippedRecord>,
}

/// 포맷별 파서.
pub trait ExportParser: Send + Sync {
    fn format(&self) -> ImportFormat;

    /// 원문이 이 포맷의 특징을 갖는지.
    fn matches(&self, sample: &Sample<'_>) -> bool;

    /// 원문 전체를 파싱합니다. 레코드 단위 문제는 `skipped`로 보고합니다.
    fn parse(&self, text: &str, ctx: &ParseContext) -> Result<ParsedBatch, ImportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_each_format() {
        let cases = [
            (
                "<?xml version=\"1.0\"?><NinjaTrader><Execution></Execution></NinjaTrader>",
                ImportFormat::NinjaTraderXml,
            ),
            (
                "Position ID,Timestamp,Buy Price,Sell Price,P/L,Net Pos\n",
                ImportFormat::TradovatePositionHistory,
            ),
            (
                "Número de trade;Instrumento;Precio de entrada;Precio de salida;Ganancias\n",
                ImportFormat::NinjaTraderTradesEs,
            ),
            (
                "Instrumento;Acción;Cantidad;Precio;Tiempo;ID;E/X\n",
                ImportFormat::NinjaTraderExecutionsEs,
            ),
            (
                "Instrument,Action,Quantity,Price,Time\n",
                ImportFormat::NinjaTraderExecutionsEn,
            ),
        ];

        for (text, expected) in cases {
            let detection = detect(text);
            assert_eq!(detection.format, expected, "{text}");
            assert_eq!(detection.confidence, Confidence::Hallmark);
        }
    }

    #[test]
    fn test_detect_skips_bom_and_blank_lines() {
        let text = "\u{feff}\n\n  Instrument,Action,Quantity\n";
        assert_eq!(detect(text).format, ImportFormat::NinjaTraderExecutionsEn);
        assert_eq!(detect(text).confidence, Confidence::Hallmark);
    }

    #[test]
    fn test_unknown_payload_falls_back() {
        let detection = detect("foo,bar,baz\n1,2,3\n");
        assert_eq!(detection.format, ImportFormat::FALLBACK);
        assert_eq!(detection.confidence, Confidence::Fallback);
    }

    #[test]
    fn test_platform() {
        assert_eq!(ImportFormat::TradovatePositionHistory.platform(), "tradovate");
        assert_eq!(ImportFormat::NinjaTraderXml.platform(), "ninjatrader");
    }
}
