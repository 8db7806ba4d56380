use std::collections::BTreeMap;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::domain::models::{auth::AuthContext, finance::CurrencyTotal, order::TestOrder};

/// Admins always see finance; employees need their own flag and the
/// lab-wide switch.
pub fn can_view_finance(ctx: &AuthContext, user_flag: bool, lab_shows_finance: bool) -> bool {
    ctx.is_admin() || (user_flag && lab_shows_finance)
}

/// `[start of first day, start of the day after last)` in UTC.
pub fn date_range_bounds(first: NaiveDate, last: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = first.and_time(NaiveTime::MIN).and_utc();
    let end = last.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
    (start, end)
}

pub fn totals_by_currency(orders: &[TestOrder]) -> Vec<CurrencyTotal> {
    let mut totals: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
    for order in orders {
        let entry = totals.entry(order.currency.as_str()).or_default();
        entry.0 += order.price;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(currency, (total, order_count))| CurrencyTotal {
            currency: currency.to_string(),
            total,
            order_count,
        })
        .collect()
}
