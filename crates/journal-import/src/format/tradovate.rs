//! Tradovate Position History CSV.
//!
//! 한 행이 짝지어진 매수/매도 한 쌍입니다. `Net Pos`가 0이고 `P/L`이 있는
//! 행만 청산된 거래로 봅니다. 먼저 체결된 레그가 진입이며, 두 타임스탬프가
//! 같으면 가격 순서(매수가 < 매도가 → 롱)로 방향을 정합니다.
//! 손익은 브로커 보고값(수수료 포함)을 그대로 쓰고 수수료는 0으로 기록합니다.

use journal_core::{NormalizedTrade, TradeDraft, TradeSide};
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

pub struct TradovateParser;

struct Columns {
    position_id: Option<usize>,
    pair_id: Option<usize>,
    account: Option<usize>,
    product: Option<usize>,
    contract: Option<usize>,
    description: Option<usize>,
    trade_date: Option<usize>,
    currency: Option<usize>,
    net_pos: Option<usize>,
    quantity: Option<usize>,
    buy_price: Option<usize>,
    sell_price: Option<usize>,
    pnl: Option<usize>,
    bought_at: Option<usize>,
    sold_at: Option<usize>,
}

impl Columns {
    fn locate(table: &Table) -> Self {
        Self {
            position_id: table.column(&["Position ID"]),
            pair_id: table.column(&["Pair ID"]),
            account: table.column(&["Account"]),
            product: table.column(&["Product"]),
            contract: table.column(&["Contract"]),
            description: table.column(&["Product Description"]),
            trade_date: table.column(&["Trade Date"]),
            currency: table.column(&["Currency"]),
            net_pos: table.column(&["Net Pos"]),
            quantity: table.column(&["Paired Qty"]),
            buy_price: table.column(&["Buy Price"]),
            sell_price: table.column(&["Sell Price"]),
            pnl: table.column(&["P/L"]),
            bought_at: table.column(&["Bought Timestamp"]),
            sold_at: table.column(&["Sold Timestamp"]),
        }
    }
}

impl ExportParser for TradovateParser {
    fn format(&self) -> ImportFormat {
        ImportFormat::TradovatePositionHistory
    }

    fn matches(&self, sample: &Sample<'_>) -> bool {
        sample.header_has_all(&["Position ID", "Buy Price", "Sell Price", "P/L"])
    }

    fn parse(&self, text: &str, ctx: &ParseContext) -> Result<ParsedBatch, ImportError> {
        let table = Table::read(text, b',')?;
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
    parse_decimal(raw, NumberLocale::Dot).ok_or_else(|| format!("invalid {name} {raw:?}"))
}

fn trade_from_row(
    row: &Row,
    table: &Table,
    cols: &Columns,
    ctx: &ParseContext,
) -> Result<NormalizedTrade, String> {
    let pnl = number(row, cols.pnl, "P/L")?;
    if cols.net_pos.is_some() {
        let net_pos = row
            .get(cols.net_pos)
            .and_then(|v| parse_decimal(v, NumberLocale::Dot));
        if net_pos != Some(Decimal::ZERO) {
            return Err("position not closed (Net Pos != 0)".to_string());
        }
    }

    let position_id = row.require(cols.position_id, "Position ID")?;
    let pair_id = row.get(cols.pair_id).unwrap_or("0");
    let instrument = row
        .get(cols.product)
        .or_else(|| row.get(cols.contract))
        .ok_or_else(|| "missing Product/Contract".to_string())?;
    let quantity = number(row, cols.quantity, "Paired Qty")?;
    if quantity <= Decimal::ZERO {
        return Err(format!("invalid Paired Qty {quantity}"));
    }
    let buy_price = number(row, cols.buy_price, "Buy Price")?;
    let sell_price = number(row, cols.sell_price, "Sell Price")?;

    let time = |col: Option<usize>, name: &str| -> Result<_, String> {
        let raw = row.require(col, name)?;
        parse_timestamp(raw, DateOrder::MonthFirst, ctx.timezone)
            .ok_or_else(|| format!("invalid {name} {raw:?}"))
    };
    let bought_at = time(cols.bought_at, "Bought Timestamp")?;
    let sold_at = time(cols.sold_at, "Sold Timestamp")?;

    let long = if bought_at == sold_at {
        buy_price < sell_price
    } else {
        bought_at < sold_at
    };

    let (side, entry_price, exit_price, entry_time, exit_time) = if long {
        (TradeSide::Buy, buy_price, sell_price, bought_at, sold_at)
    } else {
        (TradeSide::Sell, sell_price, buy_price, sold_at, bought_at)
    };

    let description = row.get(cols.description).unwrap_or("");
    let metadata = serde_json::json!({
        "positionId": position_id,
        "pairId": pair_id,
        "contract": row.get(cols.contract),
        "tradeDate": row.get(cols.trade_date),
        "currency": row.get(cols.currency),
        "raw": row.to_json(table),
    });

    TradeDraft {
        id: format!("tradovate_{position_id}_{pair_id}"),
        account_id: row.get(cols.account).unwrap_or("Tradovate").to_string(),
        platform: "tradovate".to_string(),
        instrument: instrument.to_string(),
        side,
        entry_price,
        exit_price,
        quantity,
        entry_time,
        exit_time,
        pnl,
        commission: Decimal::ZERO,
        notes: format!("Tradovate {description}").trim_end().to_string(),
        metadata,
    }
    .into_trade()
    .map_err(|e| e.to_string())
}
