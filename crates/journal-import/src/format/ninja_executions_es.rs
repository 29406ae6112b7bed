//! NinjaTrader 체결 내보내기 (스페인어).
//!
//! `;` 구분, 쉼표 소수점, 일/월/연 순서 날짜. `E/X` 컬럼의
//! `Entrada`/`Salida`로 진입/청산이 명시되므로 명시적 짝짓기를 사용합니다.

use super::{
    fills::{collect_fills, FillColumns, FillLayout},
    tabular::Table,
    ExportParser, ImportFormat, ParseContext, ParsedBatch, ParsedRecords, Sample,
};
use crate::{error::ImportError, number::NumberLocale, pairing::PairingStrategy, time::DateOrder};

pub struct NinjaExecutionsEsParser;

const LAYOUT: FillLayout = FillLayout {
    locale: NumberLocale::Comma,
    date_order: DateOrder::DayFirst,
    default_account: "Default",
};

impl ExportParser for NinjaExecutionsEsParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::NinjaTraderExecutionsEs
    }

    fn matches(&self, sample: &Sample<'_>) -> bool {
        sample.header_has_all(&["Instrumento", "Acción", "E/X"])
    }

    fn parse(&self, text: &str, ctx: &ParseContext) -> Result<ParsedBatch, ImportError> {
        let table = Table::read(text, b';')?;

        let cols = FillColumns {
            account: table.column(&["Nombre de cuenta de pantalla", "Cuenta"]),
            instrument: table.column(&["Instrumento"]),
            action: table.column(&["Acción"]),
            quantity: table.column(&["Cantidad"]),
            price: table.column(&["Precio"]),
            time: table.column(&["Tiempo"]),
            commission: table.column(&["Comisión"]),
            fee: table.column(&["Tarifa"]),
            marker: table.column(&["E/X"]),
            order_id: table.column(&["ID de orden"]),
            execution_id: table.column(&["ID"]),
            order_type: table.column(&["Tipo"]),
        };

        let (executions, skipped) = collect_fills(&table, &cols, &LAYOUT, ctx.timezone);

        Ok(ParsedBatch {
            format: self.format(),
            records: ParsedRecords::Executions {
                executions,
                strategy: PairingStrategy::Explicit,
            },
            skipped,
        })
    }
}
