//! Aggregate statistics over a set of cars

use crate::models::Car;
use serde::Serialize;

/// Summary of a car snapshot; recomputed from scratch every time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub count: usize,
    pub total_profit: f64,
    pub average_profit: f64,
    /// Cars with profit strictly above zero
    pub profitable_count: usize,
}

impl AggregateStats {
    pub fn from_cars<'a, I>(cars: I) -> Self
    where
        I: IntoIterator<Item = &'a Car>,
    {
        let mut stats = AggregateStats::default();

        for car in cars {
            stats.count += 1;
            stats.total_profit += car.profit;
            if car.is_profitable() {
                stats.profitable_count += 1;
            }
        }

        stats.average_profit = if stats.count > 0 {
            stats.total_profit / stats.count as f64
        } else {
            0.0
        };

        stats
    }
}
