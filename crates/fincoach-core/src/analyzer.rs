//! Transaction Analyzer
//!
//! Turns a user's transaction list into an immutable numeric snapshot:
//! totals, trailing-window sums, per-category breakdown, averages and trends.
//!
//! Two kinds of time bucketing are used and must not be mixed up:
//! - **Trailing windows** (`timeframes`) are fixed-width durations ending at
//!   `now` (7/30/90/365 days), inclusive of the boundary instant.
//! - **Calendar months** (`by_month`, month-over-month trends) are keyed by
//!   `YYYY-MM`.
//!
//! An empty transaction list is a valid input and yields the zero snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{round2, Category, Transaction, UserProfile};

/// Sums over trailing windows anchored at `now`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeframes {
    pub last_7_days: f64,
    pub last_30_days: f64,
    pub last_90_days: f64,
    pub last_365_days: f64,
}

/// Average spend derived from the span of the transaction history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
}

/// One calendar month compared with the month before it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub amount: f64,
    pub previous_amount: f64,
    /// `None` when the previous month's total is zero
    pub change_percent: Option<f64>,
}

/// Recent (trailing 90 days) spending for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTrend {
    pub total: f64,
    pub count: usize,
    /// Share of all recent spending, 0 when there was none
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    pub month_over_month: Vec<MonthlyTrend>,
    pub category_trends: BTreeMap<Category, CategoryTrend>,
}

/// Per-request numeric summary of a user's transactions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub total_spent: f64,
    pub transaction_count: usize,
    /// Transactions recorded in the 24 hours before `now`
    pub last_24h_count: usize,
    pub category_breakdown: BTreeMap<Category, f64>,
    /// Calendar-month sums keyed by `YYYY-MM`
    pub by_month: BTreeMap<String, f64>,
    pub timeframes: Timeframes,
    pub averages: Averages,
    pub trends: Trends,
    /// Currency of the profile the snapshot was built for
    pub currency: String,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisSnapshot {
    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }

    /// Categories ordered by spend, largest first (ties keep category order)
    pub fn top_categories(&self, n: usize) -> Vec<(Category, f64)> {
        let mut categories: Vec<(Category, f64)> = self
            .category_breakdown
            .iter()
            .map(|(cat, amount)| (*cat, *amount))
            .collect();
        categories.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        categories.truncate(n);
        categories
    }

    pub fn largest_category(&self) -> Option<(Category, f64)> {
        self.top_categories(1).into_iter().next()
    }

    /// Most recent month-over-month entry
    pub fn latest_change(&self) -> Option<&MonthlyTrend> {
        self.trends.month_over_month.last()
    }
}

/// Build a snapshot from a transaction list.
///
/// Pure: the same inputs (including `now`) always produce the same snapshot.
pub fn analyze(
    transactions: &[Transaction],
    profile: &UserProfile,
    now: DateTime<Utc>,
) -> AnalysisSnapshot {
    let mut snapshot = AnalysisSnapshot {
        currency: profile.currency.clone(),
        generated_at: now,
        ..Default::default()
    };

    if transactions.is_empty() {
        return snapshot;
    }

    let total: f64 = transactions.iter().map(|t| t.amount).sum();

    let mut breakdown: BTreeMap<Category, f64> = BTreeMap::new();
    for tx in transactions {
        *breakdown.entry(tx.category).or_insert(0.0) += tx.amount;
    }

    snapshot.total_spent = round2(total);
    snapshot.transaction_count = transactions.len();
    snapshot.last_24h_count = transactions
        .iter()
        .filter(|t| within(t.date, now, Duration::hours(24)))
        .count();
    snapshot.category_breakdown = breakdown.into_iter().map(|(c, v)| (c, round2(v))).collect();
    snapshot.by_month = by_month(transactions);
    snapshot.timeframes = timeframes(transactions, now);
    snapshot.averages = averages(transactions, total);
    snapshot.trends = Trends {
        month_over_month: month_over_month(&snapshot.by_month),
        category_trends: category_trends(transactions, now),
    };

    snapshot
}

fn within(date: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    date >= now - window && date <= now
}

fn window_sum(transactions: &[Transaction], now: DateTime<Utc>, days: i64) -> f64 {
    round2(
        transactions
            .iter()
            .filter(|t| within(t.date, now, Duration::days(days)))
            .map(|t| t.amount)
            .sum(),
    )
}

fn timeframes(transactions: &[Transaction], now: DateTime<Utc>) -> Timeframes {
    Timeframes {
        last_7_days: window_sum(transactions, now, 7),
        last_30_days: window_sum(transactions, now, 30),
        last_90_days: window_sum(transactions, now, 90),
        last_365_days: window_sum(transactions, now, 365),
    }
}

/// Span between oldest and newest transaction, never less than one day
fn span_days(transactions: &[Transaction]) -> i64 {
    let oldest = transactions.iter().map(|t| t.date).min();
    let newest = transactions.iter().map(|t| t.date).max();
    match (oldest, newest) {
        (Some(first), Some(last)) => (last - first).num_days().max(1),
        _ => 1,
    }
}

fn averages(transactions: &[Transaction], total: f64) -> Averages {
    let daily = total / span_days(transactions) as f64;
    Averages {
        daily: round2(daily),
        weekly: round2(daily * 7.0),
        monthly: round2(daily * 30.0),
    }
}

/// Calendar-month sums keyed by `YYYY-MM`
pub fn by_month(transactions: &[Transaction]) -> BTreeMap<String, f64> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for tx in transactions {
        *months.entry(tx.date.format("%Y-%m").to_string()).or_insert(0.0) += tx.amount;
    }
    months.into_iter().map(|(k, v)| (k, round2(v))).collect()
}

fn month_over_month(months: &BTreeMap<String, f64>) -> Vec<MonthlyTrend> {
    let entries: Vec<(&String, &f64)> = months.iter().collect();
    entries
        .windows(2)
        .map(|pair| {
            let (_, previous) = pair[0];
            let (month, amount) = pair[1];
            MonthlyTrend {
                month: month.clone(),
                amount: *amount,
                previous_amount: *previous,
                change_percent: percent_change(*previous, *amount),
            }
        })
        .collect()
}

fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some(round2((current - previous) / previous * 100.0))
}

fn category_trends(
    transactions: &[Transaction],
    now: DateTime<Utc>,
) -> BTreeMap<Category, CategoryTrend> {
    let recent: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| within(t.date, now, Duration::days(90)))
        .collect();
    let recent_total: f64 = recent.iter().map(|t| t.amount).sum();

    let mut sums: BTreeMap<Category, (f64, usize)> = BTreeMap::new();
    for tx in &recent {
        let entry = sums.entry(tx.category).or_insert((0.0, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(category, (total, count))| {
            let percentage = if recent_total > 0.0 {
                round2(total / recent_total * 100.0)
            } else {
                0.0
            };
            (
                category,
                CategoryTrend {
                    total: round2(total),
                    count,
                    percentage,
                },
            )
        })
        .collect()
}
