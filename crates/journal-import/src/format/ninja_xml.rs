//! NinjaTrader 체결 XML.
//!
//! `<Execution>` 요소마다 하나의 체결이며 진입/청산 표시가 없으므로
//! 위치 기반 짝짓기를 사용합니다.

use journal_core::RawExecution;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;

use super::{
    ExportParser, ImportFormat, ParseContext, ParsedBatch, ParsedRecords, Sample, SkippedRecord,
};
use crate::{
    error::ImportError,
    number::{parse_decimal, NumberLocale},
    pairing::PairingStrategy,
    time::{parse_timestamp, DateOrder},
};

pub struct NinjaXmlParser;

impl ExportParser for NinjaXmlParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::NinjaTraderXml
    }

    fn matches(&self, sample: &Sample<'_>) -> bool {
        sample.text.starts_with('<') && sample.text.contains("<Execution")
    }

    fn parse(&self, text: &str, ctx: &ParseContext) -> Result<ParsedBatch, ImportError> {
        let text = super::strip_bom(text).trim();
        if text.is_empty() {
            return Err(ImportError::EmptyPayload);
        }

        let doc = Document::parse(text)?;

        let mut executions = Vec::new();
        let mut skipped = Vec::new();

        for (index, node) in doc
            .descendants()
            .filter(|n| n.has_tag_name("Execution"))
            .enumerate()
        {
            match execution_from_node(node, ctx) {
                Ok(fill) => executions.push(fill),
                Err(reason) => skipped.push(SkippedRecord::new(index + 1, reason)),
            }
        }

        Ok(ParsedBatch {
            format: self.format(),
            records: ParsedRecords::Executions {
                executions,
                strategy: PairingStrategy::Positional,
            },
            skipped,
        })
    }
}

/// 첫 번째 하위 요소의 텍스트 (공백 제거, 빈 값은 `None`).
fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.descendants()
        .find(|c| c.has_tag_name(tag))
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn execution_from_node(node: Node<'_, '_>, ctx: &ParseContext) -> Result<RawExecution, String> {
    let require = |tag: &'static str| child_text(node, tag).ok_or_else(|| format!("missing {tag}"));
    let number = |tag: &'static str| -> Result<Decimal, String> {
        let raw = require(tag)?;
        parse_decimal(raw, NumberLocale::Dot).ok_or_else(|| format!("invalid {tag} {raw:?}"))
    };

    let instrument = require("Instrument")?;
    let action = require("Action")?;
    let quantity = number("Quantity")?;
    if quantity <= Decimal::ZERO {
        return Err(format!("invalid Quantity {quantity}"));
    }
    let price = number("Price")?;
    let time_raw = require("Time")?;
    let time = parse_timestamp(time_raw, DateOrder::MonthFirst, ctx.timezone)
        .ok_or_else(|| format!("invalid Time {time_raw:?}"))?;

    let account = child_text(node, "Account").unwrap_or("Default");
    let commission = child_text(node, "Commission")
        .and_then(|v| parse_decimal(v, NumberLocale::Dot))
        .map(|v| v.abs())
        .unwrap_or(Decimal::ZERO);

    let mut fill = RawExecution::new(account, instrument, action, quantity, price, time)
        .with_commission(commission);
    if let Some(order_id) = child_text(node, "OrderId") {
        fill = fill.with_order_id(order_id);
    }
    if let Some(execution_id) = child_text(node, "ExecutionId") {
        fill = fill.with_execution_id(execution_id);
    }
    if let Some(order_type) = child_text(node, "OrderType") {
        fill = fill.with_order_type(order_type);
    }

    Ok(fill)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<NinjaTrader>
  <Executions>
    <Execution>
      <Account>Sim101</Account>
      <Time>2025-01-06T09:30:00</Time>
      <Instrument>MES 03-25</Instrument>
      <Action>Buy</Action>
      <Quantity>2</Quantity>
      <Price>6000.25</Price>
      <OrderType>Market</OrderType>
      <Commission>1.24</Commission>
      <OrderId>o1</OrderId>
      <ExecutionId>x1</ExecutionId>
    </Execution>
    <Execution>
      <Account>Sim101</Account>
      <Time>2025-01-06T09:40:00</Time>
      <Instrument>MES 03-25</Instrument>
      <Action>Sell</Action>
      <Quantity>2</Quantity>
      <Price>6005.25</Price>
      <OrderId>o1</OrderId>
      <ExecutionId>x2</ExecutionId>
    </Execution>
    <Execution>
      <Account>Sim101</Account>
      <Instrument>MES 03-25</Instrument>
      <Action>Sell</Action>
    </Execution>
  </Executions>
</NinjaTrader>
"#;

    #[test]
    fn test_parse_xml_executions() {
        let batch = NinjaXmlParser
            .parse(SAMPLE, &ParseContext::default())
            .unwrap();

        let ParsedRecords::Executions {
            executions,
            strategy,
        } = batch.records
        else {
            panic!("expected executions");
        };
        assert_eq!(strategy, PairingStrategy::Positional);
        assert_eq!(executions.len(), 2);
        assert_eq!(executions[0].price, dec!(6000.25));
        assert_eq!(executions[0].commission, dec!(1.24));
        assert_eq!(executions[0].execution_id.as_deref(), Some("x1"));
        assert_eq!(executions[0].order_type.as_deref(), Some("Market"));

        assert_eq!(batch.skipped, vec![SkippedRecord::new(3, "missing Quantity")]);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let err = NinjaXmlParser
            .parse("<Execution><Price>1</Execution>", &ParseContext::default())
            .unwrap_err();
        assert!(matches!(err, ImportError::Xml(_)));
    }

    #[test]
    fn test_matches() {
        assert!(NinjaXmlParser.matches(&Sample::new("  <?xml?><Executions><Execution/>")));
        assert!(!NinjaXmlParser.matches(&Sample::new("Instrument,Action\n")));
    }
}
