//! Ordering keys for queue members.
//!
//! Keys are spaced `gap` apart on append so that most reorders land between
//! two existing keys without touching any other member. When two neighbors
//! get too close to split, the caller re-spaces the whole queue with
//! [`KeySpace::respaced`] and asks again.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub const DEFAULT_GAP: f64 = 1024.0;
pub const DEFAULT_INITIAL_KEY: f64 = 1024.0;
pub const DEFAULT_MIN_GAP: f64 = 1e-6;

/// Position of an item within its queue. Totally ordered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderingKey(f64);

impl OrderingKey {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for OrderingKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OrderingKey {}

impl PartialOrd for OrderingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for OrderingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySpace {
    pub gap: f64,
    pub initial: f64,
    /// Smallest neighbor distance that may still be split.
    pub min_gap: f64,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self {
            gap: DEFAULT_GAP,
            initial: DEFAULT_INITIAL_KEY,
            min_gap: DEFAULT_MIN_GAP,
        }
    }
}

impl KeySpace {
    /// Key for a new queue tail. `None` means the float can no longer step
    /// past `last` and the queue must be re-spaced first.
    pub fn append(&self, last: Option<OrderingKey>) -> Option<OrderingKey> {
        match last {
            None => Some(OrderingKey(self.initial)),
            Some(last) => Self::strictly_above(last, last.0 + self.gap),
        }
    }

    /// Key strictly between `low` and `high`, or `None` when the bounds are
    /// exhausted (too close, inverted, or out of float precision).
    pub fn between(
        &self,
        low: Option<OrderingKey>,
        high: Option<OrderingKey>,
    ) -> Option<OrderingKey> {
        match (low, high) {
            (Some(low), Some(high)) => {
                if !(high.0 - low.0 >= self.min_gap) {
                    return None;
                }
                let mid = low.0 + (high.0 - low.0) / 2.0;
                (low.0 < mid && mid < high.0).then_some(OrderingKey(mid))
            }
            (Some(low), None) => Self::strictly_above(low, low.0 + 1.0),
            (None, Some(high)) => {
                let candidate = high.0 - 1.0;
                (candidate.is_finite() && candidate < high.0).then_some(OrderingKey(candidate))
            }
            (None, None) => Some(OrderingKey(self.initial)),
        }
    }

    /// Uniformly spaced keys for a queue of `len` members, in order.
    pub fn respaced(&self, len: usize) -> Vec<OrderingKey> {
        (0..len)
            .map(|idx| OrderingKey(self.initial + self.gap * idx as f64))
            .collect()
    }

    fn strictly_above(bound: OrderingKey, candidate: f64) -> Option<OrderingKey> {
        (candidate.is_finite() && candidate > bound.0).then_some(OrderingKey(candidate))
    }
}

/// True when every key is strictly greater than the one before it.
pub fn is_strictly_increasing<I>(keys: I) -> bool
where
    I: IntoIterator<Item = OrderingKey>,
{
    let mut previous: Option<OrderingKey> = None;
    for key in keys {
        if let Some(prev) = previous {
            if key <= prev {
                return false;
            }
        }
        previous = Some(key);
    }
    true
}
