//! 표 형식 체결 행 → RawExecution.

use chrono_tz::Tz;
use journal_core::{EntryExit, RawExecution};
use rust_decimal::Decimal;

use super::{
    tabular::{Row, Table},
    SkippedRecord,
};
use crate::{
    number::{parse_decimal, NumberLocale},
    time::{parse_timestamp, DateOrder},
};

/// 체결 포맷의 컬럼 위치.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FillColumns {
    pub account: Option<usize>,
    pub instrument: Option<usize>,
    pub action: Option<usize>,
    pub quantity: Option<usize>,
    pub price: Option<usize>,
    pub time: Option<usize>,
    pub commission: Option<usize>,
    pub fee: Option<usize>,
    pub marker: Option<usize>,
    pub order_id: Option<usize>,
    pub execution_id: Option<usize>,
    pub order_type: Option<usize>,
}

/// 행 해석 규칙.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FillLayout {
    pub locale: NumberLocale,
    pub date_order: DateOrder,
    pub default_account: &'static str,
}

impl FillColumns {
    pub fn has_required(&self) -> bool {
        self.instrument.is_some() && self.action.is_some()
    }
}

/// 행 하나를 체결로 변환합니다. 필수 필드 문제는 사유 문자열로 돌려줍니다.
pub(crate) fn fill_from_row(
    row: &Row,
    cols: &FillColumns,
    layout: &FillLayout,
    tz: Tz,
) -> Result<RawExecution, String> {
    let instrument = row.require(cols.instrument, "instrument")?;
    let action = row.require(cols.action, "action")?;

    let quantity_raw = row.require(cols.quantity, "quantity")?;
    let quantity = parse_decimal(quantity_raw, layout.locale)
        .filter(|q| *q > Decimal::ZERO)
        .ok_or_else(|| format!("invalid quantity {quantity_raw:?}"))?;

    let price_raw = row.require(cols.price, "price")?;
    let price = parse_decimal(price_raw, layout.locale)
        .ok_or_else(|| format!("invalid price {price_raw:?}"))?;

    let time_raw = row.require(cols.time, "time")?;
    let time = parse_timestamp(time_raw, layout.date_order, tz)
        .ok_or_else(|| format!("invalid time {time_raw:?}"))?;

    let amount = |col: Option<usize>| {
        row.get(col)
            .and_then(|v| parse_decimal(v, layout.locale))
            .map(|v| v.abs())
            .unwrap_or(Decimal::ZERO)
    };

    let account = row.get(cols.account).unwrap_or(layout.default_account);

    let mut fill = RawExecution::new(account, instrument, action, quantity, price, time)
        .with_commission(amount(cols.commission))
        .with_fee(amount(cols.fee));

    if let Some(marker) = row.get(cols.marker).and_then(EntryExit::parse) {
        fill = fill.with_marker(marker);
    }
    if let Some(order_id) = row.get(cols.order_id) {
        fill = fill.with_order_id(order_id);
    }
    if let Some(execution_id) = row.get(cols.execution_id) {
        fill = fill.with_execution_id(execution_id);
    }
    if let Some(order_type) = row.get(cols.order_type) {
        fill = fill.with_order_type(order_type);
    }

    Ok(fill)
}

/// 표 전체를 체결 목록과 제외 목록으로 나눕니다.
pub(crate) fn collect_fills(
    table: &Table,
    cols: &FillColumns,
    layout: &FillLayout,
    tz: Tz,
) -> (Vec<RawExecution>, Vec<SkippedRecord>) {
    let mut fills = Vec::with_capacity(table.rows.len());
    let mut skipped = table.unreadable.clone();

    for row in &table.rows {
        match fill_from_row(row, cols, layout, tz) {
            Ok(fill) => fills.push(fill),
            Err(reason) => skipped.push(SkippedRecord::new(row.line, reason)),
        }
    }

    (fills, skipped)
}
