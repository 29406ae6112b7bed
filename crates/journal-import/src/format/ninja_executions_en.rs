//! NinjaTrader 체결 CSV (영어). 판별 실패 시 대체 파서이기도 합니다.
//!
//! `E/X` 컬럼에 `Entry`/`Exit` 표시가 있으면 명시적 짝짓기,
//! 없으면 위치 기반 짝짓기를 사용합니다.

use super::{
    fills::{collect_fills, FillColumns, FillLayout},
    tabular::Table,
    ExportParser, ImportFormat, ParseContext, ParsedBatch, ParsedRecords, Sample,
};
use crate::{error::ImportError, number::NumberLocale, pairing::PairingStrategy, time::DateOrder};

pub struct NinjaExecutionsEnParser;

const LAYOUT: FillLayout = FillLayout {
    locale: NumberLocale::Dot,
    date_order: DateOrder::MonthFirst,
    default_account: "Default",
};

impl ExportParser for NinjaExecutionsEnParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::NinjaTraderExecutionsEn
    }

    fn matches(&self, sample: &Sample<'_>) -> bool {
        sample.header_has_all(&["Instrument", "Action"])
    }

    fn parse(&self, text: &str, ctx: &ParseContext) -> Result<ParsedBatch, ImportError> {
        let table = Table::read(text, b',')?;

        let cols = FillColumns {
            account: table.column(&["Account", "Account display name"]),
            instrument: table.column(&["Instrument"]),
            action: table.column(&["Action"]),
            quantity: table.column(&["Quantity", "Qty"]),
            price: table.column(&["Price"]),
            time: table.column(&["Time", "Date"]),
            commission: table.column(&["Commission"]),
            fee: table.column(&["Fee", "Fees"]),
            marker: table.column(&["E/X", "Entry/Exit"]),
            order_id: table.column(&["OrderId", "Order ID"]),
            execution_id: table.column(&["ExecutionId", "Execution ID", "ID"]),
            order_type: table.column(&["OrderType", "Order Type"]),
        };

        if !cols.has_required() {
            tracing::warn!("체결 CSV에 Instrument/Action 컬럼이 없음, 모든 행이 제외됩니다");
        }

        let (executions, skipped) = collect_fills(&table, &cols, &LAYOUT, ctx.timezone);

        let explicit = table.has_column(&["E/X", "Entry/Exit"])
            && executions.iter().any(|e| e.entry_exit.is_some());
        let strategy = if explicit {
            PairingStrategy::Explicit
        } else {
            PairingStrategy::Positional
        };

        Ok(ParsedBatch {
            format: self.format(),
            records: ParsedRecords::Executions {
                executions,
                strategy,
            },
            skipped,
        })
    }
}
