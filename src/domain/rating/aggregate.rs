//! Rating statistics derived on read from live rating rows.

use serde::Serialize;

/// Average and count of a store's ratings
///
/// `average` is `None` exactly when `count` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreAggregate {
    pub average: Option<f64>,
    pub count: i64,
}

impl StoreAggregate {
    /// Aggregate of a store nobody has rated yet
    pub const EMPTY: StoreAggregate = StoreAggregate {
        average: None,
        count: 0,
    };

    /// Builds an aggregate from raw rating values
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0i64, 0i64), |(sum, count), v| (sum + i64::from(v), count + 1));

        if count == 0 {
            return Self::EMPTY;
        }
        Self {
            average: Some(sum as f64 / count as f64),
            count,
        }
    }
}

/// Weighted rating across all stores of one owner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerOverall {
    pub average: Option<f64>,
    pub count: i64,
}

/// Weighted average across an owner's stores
///
/// `Σ(avg_i × count_i) / Σ(count_i)` over stores with at least one rating,
/// so a store with many ratings weighs more than one with a single rating.
/// Unrated stores add nothing to either sum; the average is `None` when the
/// total count is zero.
///
/// # Example
/// ```
/// use store_ratings_api::domain::rating::{overall_for_owner, StoreAggregate};
///
/// let overall = overall_for_owner(&[
///     StoreAggregate { average: Some(4.0), count: 2 },
///     StoreAggregate { average: Some(5.0), count: 1 },
/// ]);
/// assert_eq!(overall.count, 3);
/// assert!((overall.average.unwrap() - 13.0 / 3.0).abs() < 1e-9);
/// ```
pub fn overall_for_owner<'a, I>(aggregates: I) -> OwnerOverall
where
    I: IntoIterator<Item = &'a StoreAggregate>,
{
    let (weighted_sum, count) = aggregates
        .into_iter()
        .filter(|agg| agg.count > 0)
        .filter_map(|agg| agg.average.map(|avg| (avg, agg.count)))
        .fold((0.0f64, 0i64), |(sum, total), (avg, count)| {
            (sum + avg * count as f64, total + count)
        });

    OwnerOverall {
        average: (count > 0).then(|| weighted_sum / count as f64),
        count,
    }
}
