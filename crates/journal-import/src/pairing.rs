//! 체결 → 왕복 거래 짝짓기.
//!
//! 체결은 계좌별로(처음 등장 순서) 묶고 각 그룹 안에서 시각 오름차순으로
//! 안정 정렬합니다. 입력 체결은 정확히 한 번, 거래의 레그이거나
//! [`UnmatchedExecution`]으로 보고됩니다. 버려지는 체결은 없습니다.
//!
//! # 전략
//!
//! - [`PairingStrategy::Explicit`]: 진입/청산 표시가 있는 포맷. 청산마다(시각 순)
//!   아직 쓰이지 않은 진입 중 `entry.time < exit.time`이고 방향이 맞는
//!   (CloseLong ↔ OpenLong, CloseShort ↔ OpenShort) 가장 이른 것을 고릅니다.
//! - [`PairingStrategy::Positional`]: 표시가 없는 포맷. (종목, 주문 ID 또는 시각)으로
//!   묶어 i번째 매수 계열과 i번째 매도 계열을 짝짓습니다. 수량/시각 일치는
//!   검사하지 않는 알려진 한계가 있습니다.
//!
//! # 거래 ID
//!
//! 체결 ID가 없는 체결은 내용 fingerprint로 식별합니다. 같은 페이로드에 내용이
//! 완전히 같은 체결(같은 초, 같은 가격의 부분 체결 등)이 여럿이면 입력 순서대로
//! `~1`, `~2` 접미사를 붙여 거래 ID가 겹치지 않게 합니다. 같은 파일을 다시
//! 가져오면 같은 ID가 나옵니다.

use std::collections::HashMap;

use journal_core::{
    ActionClass, ActionVerb, CoreError, NormalizedTrade, RawExecution, TradeDraft, TradeSide,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// 짝짓기 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PairingStrategy {
    Explicit,
    Positional,
}

/// 짝을 찾지 못한 사유.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum UnmatchedReason {
    /// 앞선 진입이 없는 청산
    ExitWithoutEntry,
    /// 청산되지 않은 진입
    OpenPosition,
    /// 명시적 포맷인데 진입/청산 표시가 없음
    MissingMarker,
    /// 위치 기반 짝짓기에서 남은 체결
    UnpairedFill,
    /// 위치 기반 짝의 청산이 진입보다 앞섬
    OutOfOrder,
    /// 액션 어휘를 분류할 수 없음
    Unclassified(String),
    /// 짝은 찾았지만 거래 검증에 실패
    Rejected(String),
}

impl UnmatchedReason {
    /// 거래 생성 실패의 사유. 시각 역전 외에는 에러 메시지를 그대로 보존합니다.
    fn from_build_error(err: CoreError) -> Self {
        match err {
            CoreError::ExitBeforeEntry { .. } => Self::OutOfOrder,
            other => Self::Rejected(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedExecution {
    pub execution: RawExecution,
    pub reason: UnmatchedReason,
}

impl UnmatchedExecution {
    fn new(execution: RawExecution, reason: UnmatchedReason) -> Self {
        Self { execution, reason }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PairingOutcome {
    pub trades: Vec<NormalizedTrade>,
    pub unmatched: Vec<UnmatchedExecution>,
}

impl PairingOutcome {
    fn absorb(&mut self, other: PairingOutcome) {
        self.trades.extend(other.trades);
        self.unmatched.extend(other.unmatched);
    }

    fn reject(&mut self, leg: Leg, reason: UnmatchedReason) {
        self.unmatched.push(UnmatchedExecution::new(leg.fill, reason));
    }
}

/// 페이로드 안에서 고유한 식별자를 붙인 체결.
#[derive(Debug)]
struct Leg {
    fill: RawExecution,
    key: String,
}

/// 입력 순서대로 식별자를 붙입니다. fingerprint가 겹치면 등장 순번을 덧붙입니다.
fn assign_keys(executions: Vec<RawExecution>) -> Vec<Leg> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    executions
        .into_iter()
        .map(|fill| {
            let identity = fill.identity();
            let key = if fill.has_execution_id() {
                identity
            } else {
                let occurrence = seen.entry(identity.clone()).or_insert(0);
                let key = match *occurrence {
                    0 => identity,
                    n => format!("{identity}~{n}"),
                };
                *occurrence += 1;
                key
            };
            Leg { fill, key }
        })
        .collect()
}

/// 체결을 짝지어 왕복 거래를 만듭니다.
pub fn pair_executions(
    executions: Vec<RawExecution>,
    strategy: PairingStrategy,
    platform: &str,
) -> PairingOutcome {
    let mut outcome = PairingOutcome::default();

    for (account, legs) in group_by_account(assign_keys(executions)) {
        let total = legs.len();
        let account_outcome = match strategy {
            PairingStrategy::Explicit => pair_explicit(legs, platform),
            PairingStrategy::Positional => pair_positional(legs, platform),
        };

        info!(
            account = %account,
            strategy = ?strategy,
            executions = total,
            trades = account_outcome.trades.len(),
            unmatched = account_outcome.unmatched.len(),
            "계좌 체결 짝짓기 완료"
        );

        outcome.absorb(account_outcome);
    }

    outcome
}

/// 계좌별 그룹 (처음 등장 순서), 그룹 내 시각 오름차순 안정 정렬.
fn group_by_account(legs: Vec<Leg>) -> Vec<(String, Vec<Leg>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Leg>)> = Vec::new();

    for leg in legs {
        let slot = *index.entry(leg.fill.account.clone()).or_insert_with(|| {
            groups.push((leg.fill.account.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(leg);
    }

    for (_, legs) in &mut groups {
        legs.sort_by_key(|leg| leg.fill.time);
    }

    groups
}

fn build_trade(
    entry: &Leg,
    exit: &Leg,
    side: TradeSide,
    platform: &str,
) -> Result<NormalizedTrade, CoreError> {
    let id = format!("ninja_{}_{}", entry.key, exit.key);
    let draft = TradeDraft::from_round_trip(id, platform, &entry.fill, &exit.fill, side);
    let notes = format!(
        "NinjaTrader | commission {} | order {}",
        draft.commission.round_dp(2),
        entry.fill.order_id.as_deref().unwrap_or("-")
    );
    draft.with_notes(notes).into_trade()
}

// =============================================================================
// 명시적 짝짓기
// =============================================================================

fn pair_explicit(legs: Vec<Leg>, platform: &str) -> PairingOutcome {
    let mut outcome = PairingOutcome::default();
    let mut entries: Vec<(Leg, ActionClass)> = Vec::new();
    let mut exits: Vec<(Leg, ActionClass)> = Vec::new();

    for leg in legs {
        if leg.fill.entry_exit.is_none() {
            outcome.reject(leg, UnmatchedReason::MissingMarker);
            continue;
        }
        match leg.fill.classify() {
            Ok(class) if class.is_entry() => entries.push((leg, class)),
            Ok(class) => exits.push((leg, class)),
            Err(e) => {
                debug!(action = %leg.fill.action, "분류할 수 없는 액션");
                outcome.reject(leg, UnmatchedReason::Unclassified(e.to_string()));
            }
        }
    }

    let mut consumed = vec![false; entries.len()];

    for (exit, exit_class) in exits {
        let wanted = exit_class.opening_counterpart();
        let candidate = entries
            .iter()
            .enumerate()
            .find(|(i, (entry, class))| {
                !consumed[*i] && *class == wanted && entry.fill.time < exit.fill.time
            })
            .map(|(i, _)| i);

        let Some(i) = candidate else {
            debug!(
                action = %exit.fill.action,
                price = %exit.fill.price,
                "앞선 진입이 없는 청산"
            );
            outcome.reject(exit, UnmatchedReason::ExitWithoutEntry);
            continue;
        };

        let (entry, entry_class) = &entries[i];
        match build_trade(entry, &exit, entry_class.position_side(), platform) {
            Ok(trade) => {
                consumed[i] = true;
                outcome.trades.push(trade);
            }
            Err(e) => {
                warn!(exit = %exit.key, error = %e, "거래 생성 실패");
                outcome.reject(exit, UnmatchedReason::from_build_error(e));
            }
        }
    }

    for ((entry, _), used) in entries.into_iter().zip(consumed) {
        if !used {
            debug!(action = %entry.fill.action, price = %entry.fill.price, "청산되지 않은 진입");
            outcome.reject(entry, UnmatchedReason::OpenPosition);
        }
    }

    outcome
}

// =============================================================================
// 위치 기반 짝짓기
// =============================================================================

fn pair_positional(legs: Vec<Leg>, platform: &str) -> PairingOutcome {
    let mut outcome = PairingOutcome::default();

    // (종목, 주문 ID 또는 시각) 그룹, 처음 등장 순서
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<Vec<(Leg, ActionVerb)>> = Vec::new();

    for leg in legs {
        let verb = match ActionVerb::parse(&leg.fill.action) {
            Ok(verb) => verb,
            Err(e) => {
                outcome.reject(leg, UnmatchedReason::Unclassified(e.to_string()));
                continue;
            }
        };
        let key = (
            leg.fill.instrument.clone(),
            leg.fill
                .order_id
                .clone()
                .unwrap_or_else(|| leg.fill.time.to_rfc3339()),
        );
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push((leg, verb));
    }

    for group in groups {
        let (buys, sells): (Vec<_>, Vec<_>) = group
            .into_iter()
            .partition(|(_, verb)| verb.side() == TradeSide::Buy);

        let mut buys = buys.into_iter();
        let mut sells = sells.into_iter();

        loop {
            match (buys.next(), sells.next()) {
                (Some((buy, buy_verb)), Some((sell, _))) => {
                    let (entry, exit, side) = if buy_verb == ActionVerb::BuyToCover {
                        (sell, buy, TradeSide::Sell)
                    } else {
                        (buy, sell, TradeSide::Buy)
                    };

                    match build_trade(&entry, &exit, side, platform) {
                        Ok(trade) => outcome.trades.push(trade),
                        Err(e) => {
                            debug!(entry = %entry.key, exit = %exit.key, error = %e, "위치 기반 짝 거부");
                            let reason = UnmatchedReason::from_build_error(e);
                            outcome.reject(entry, reason.clone());
                            outcome.reject(exit, reason);
                        }
                    }
                }
                (Some((leftover, _)), None) | (None, Some((leftover, _))) => {
                    outcome.reject(leftover, UnmatchedReason::UnpairedFill);
                }
                (None, None) => break,
            }
        }
    }

    outcome
}
