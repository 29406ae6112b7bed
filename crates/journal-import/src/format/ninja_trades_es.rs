//! NinjaTrader 거래 그리드 내보내기 (스페인어).
//!
//! 브로커가 이미 짝지은 왕복 거래입니다. 손익은 `Ganancias` 값을 그대로,
//! 수수료는 `Comisión` 값을 사용하며 방향은 `Mercado pos.`(Long/Short)로 정합니다.
//! 방향 값이 없거나 알 수 없으면 그 행만 건너뜁니다.

use journal_core::{fingerprint, NormalizedTrade, TradeDraft, TradeSide};
use rust_decimal::Decimal;

use super::{
    tabular::{Row, Table},
    ExportParser, ImportFormat, ParseContext, ParsedBatch, ParsedRecords, Sample, SkippedRecord,
};
use crate::{
    error::ImportError,
    number::{parse_decimal, NumberLocale},
    time::{parse_timestamp, DateOrder},
};

pub struct NinjaTradesEsParser;

struct Columns {
    trade_no: Option<usize>,
    instrument: Option<usize>,
    account: Option<usize>,
    strategy: Option<usize>,
    market_pos: Option<usize>,
    quantity: Option<usize>,
    entry_price: Option<usize>,
    exit_price: Option<usize>,
    entry_time: Option<usize>,
    exit_time: Option<usize>,
    entry_name: Option<usize>,
    exit_name: Option<usize>,
    profit: Option<usize>,
    cum_net_profit: Option<usize>,
    commission: Option<usize>,
    mae: Option<usize>,
    mfe: Option<usize>,
    etd: Option<usize>,
}

impl Columns {
    fn locate(table: &Table) -> Self {
        Self {
            trade_no: table.column(&["Número de trade"]),
            instrument: table.column(&["Instrumento"]),
            account: table.column(&["Cuenta"]),
            strategy: table.column(&["Estrategia"]),
            market_pos: table.column(&["Mercado pos."]),
            quantity: table.column(&["Cant.", "Cantidad"]),
            entry_price: table.column(&["Precio de entrada"]),
            exit_price: table.column(&["Precio de salida"]),
            entry_time: table.column(&["Tiempo de entrada"]),
            exit_time: table.column(&["Tiempo de salida"]),
            entry_name: table.column(&["Nombre de entrada"]),
            exit_name: table.column(&["Nombre de salida"]),
            profit: table.column(&["Ganancias"]),
            cum_net_profit: table.column(&["Con ganancia neto"]),
            commission: table.column(&["Comisión"]),
            mae: table.column(&["MAE"]),
            mfe: table.column(&["MFE"]),
            etd: table.column(&["ETD"]),
        }
    }
}

impl ExportParser for NinjaTradesEsParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::NinjaTraderTradesEs
    }

    fn matches(&self, sample: &Sample<'_>) -> bool {
        sample.header_has_all(&["Número de trade", "Precio de entrada", "Precio de salida"])
    }

    fn parse(&self, text: &str, ctx: &ParseContext) -> Result<ParsedBatch, ImportError> {
        let table = Table::read(text, b';')?;
        let cols = Columns::locate(&table);

        let mut trades = Vec::with_capacity(table.rows.len());
        let mut skipped = table.unreadable.clone();

        for row in &table.rows {
            match trade_from_row(row, &table, &cols, ctx) {
                Ok(trade) => trades.push(trade),
                Err(reason) => skipped.push(SkippedRecord::new(row.line, reason)),
            }
        }

        Ok(ParsedBatch {
            format: self.format(),
            records: ParsedRecords::Trades(trades),
            skipped,
        })
    }
}

fn number(row: &Row, col: Option<usize>, name: &str) -> Result<Decimal, String> {
    let raw = row.require(col, name)?;
    parse_decimal(raw, NumberLocale::Comma).ok_or_else(|| format!("invalid {name} {raw:?}"))
}

fn optional_number(row: &Row, col: Option<usize>) -> Decimal {
    row.get(col)
        .and_then(|v| parse_decimal(v, NumberLocale::Comma))
        .unwrap_or(Decimal::ZERO)
}

/// `Mercado pos.` 값 → 포지션 방향.
fn market_side(raw: &str) -> Option<TradeSide> {
    match raw.trim().to_lowercase().as_str() {
        "long" | "largo" => Some(TradeSide::Buy),
        "short" | "corto" => Some(TradeSide::Sell),
        _ => None,
    }
}

fn trade_from_row(
    row: &Row,
    table: &Table,
    cols: &Columns,
    ctx: &ParseContext,
) -> Result<NormalizedTrade, String> {
    let instrument = row.require(cols.instrument, "instrument")?;
    let pnl = number(row, cols.profit, "profit")?;
    let entry_price = number(row, cols.entry_price, "entry price")?;
    let exit_price = number(row, cols.exit_price, "exit price")?;
    let quantity = number(row, cols.quantity, "quantity")?;

    let time = |col: Option<usize>, name: &str| -> Result<_, String> {
        let raw = row.require(col, name)?;
        parse_timestamp(raw, DateOrder::DayFirst, ctx.timezone)
            .ok_or_else(|| format!("invalid {name} {raw:?}"))
    };
    let entry_time = time(cols.entry_time, "entry time")?;
    let exit_time = time(cols.exit_time, "exit time")?;

    let account = row.get(cols.account).unwrap_or("NinjaTrader");
    let trade_no = row.get(cols.trade_no).unwrap_or("0");
    let strategy = row.get(cols.strategy).unwrap_or("Manual");

    let market_pos = row.require(cols.market_pos, "market position")?;
    let side =
        market_side(market_pos).ok_or_else(|| format!("unknown market position {market_pos:?}"))?;

    let id = format!(
        "ninjatrader_{}_{}",
        trade_no,
        fingerprint(&[
            account,
            instrument,
            &entry_time.to_rfc3339(),
            &exit_time.to_rfc3339()
        ])
    );

    let metadata = serde_json::json!({
        "tradeNumber": trade_no,
        "strategy": strategy,
        "entryName": row.get(cols.entry_name),
        "exitName": row.get(cols.exit_name),
        "netProfit": optional_number(row, cols.cum_net_profit),
        "mae": optional_number(row, cols.mae),
        "mfe": optional_number(row, cols.mfe),
        "etd": optional_number(row, cols.etd),
        "raw": row.to_json(table),
    });

    TradeDraft {
        id,
        account_id: account.to_string(),
        platform: "ninjatrader".to_string(),
        instrument: instrument.to_string(),
        side,
        entry_price,
        exit_price,
        quantity,
        entry_time,
        exit_time,
        pnl,
        commission: optional_number(row, cols.commission).abs(),
        notes: format!("NinjaTrader trade #{trade_no} ({strategy})"),
        metadata,
    }
    .into_trade()
    .map_err(|e| e.to_string())
}
