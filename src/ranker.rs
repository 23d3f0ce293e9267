//! Instrument ranking
//!
//! Filters instruments by quote asset and keeps the top N by a numeric column.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use tracing::debug;

use crate::error::{MarketDataError, Result};
use crate::parser::InstrumentSnapshot;
use crate::source::MarketDataSource;

/// Whether `name` ends with `quote_suffix`, ignoring ASCII case
pub fn is_quoted_in(name: &str, quote_suffix: &str) -> bool {
    let name = name.as_bytes();
    let suffix = quote_suffix.as_bytes();
    name.len() >= suffix.len() && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Names of the `top_n` instruments quoted in `quote_suffix`, descending by `sort_field`.
///
/// Equal values come out in no particular order. An eligible instrument whose
/// `sort_field` is missing or not numeric fails the whole call.
pub fn select(
    snapshots: &[InstrumentSnapshot],
    quote_suffix: &str,
    sort_field: &str,
    top_n: usize,
) -> Result<Vec<String>> {
    if top_n == 0 {
        return Ok(Vec::new());
    }

    let mut eligible = snapshots
        .iter()
        .filter(|s| is_quoted_in(&s.name, quote_suffix))
        .map(|s| {
            s.numeric(sort_field)
                .map(|value| (OrderedFloat(value), s.name.as_str()))
                .ok_or_else(|| {
                    MarketDataError::MalformedResponse(format!(
                        "{}: field '{}' missing or not numeric",
                        s.name, sort_field
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    eligible.sort_unstable_by_key(|(value, _)| Reverse(*value));
    eligible.truncate(top_n);

    debug!(
        quote = %quote_suffix,
        field = %sort_field,
        selected = eligible.len(),
        "Ranked instruments"
    );

    Ok(eligible.into_iter().map(|(_, name)| name.to_string()).collect())
}

/// Fetch the instrument list from `url` and rank it
pub async fn fetch_and_select(
    source: &dyn MarketDataSource,
    url: &str,
    quote_suffix: &str,
    sort_field: &str,
    top_n: usize,
) -> Result<Vec<String>> {
    let snapshots = source.instruments(url).await?;
    select(&snapshots, quote_suffix, sort_field, top_n)
}
