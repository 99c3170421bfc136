//! Index selection for triple patterns.
//!
//! For each index order, the bound positions forming a leading run of the
//! order's key become a range prefix. The order with the longest prefix wins;
//! ties break SPO, then POS, then OSP. With three rotations every subset of
//! bound positions is a full prefix of some order, so the planner never needs
//! a residual check; forced orders (see `plan_for_order`) may.
//!
//! Subject and object bound together go to OSP: its two-position prefix
//! beats the single subject position SPO would cover.

use crate::query::Pattern;
use crate::storage::IndexOrder;
use crate::types::Position;

/// How a pattern is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Index scanned.
    pub order: IndexOrder,
    /// Number of leading key positions bound by the pattern.
    pub prefix_len: usize,
    /// Bound positions checked per candidate instead of by the range.
    pub residual: Vec<Position>,
}

/// Choose the index order for a pattern.
#[must_use]
pub fn plan(pattern: &Pattern) -> QueryPlan {
    let mut best = plan_for_order(pattern, IndexOrder::DEFAULT);
    for order in IndexOrder::ALL {
        let candidate = plan_for_order(pattern, order);
        if candidate.prefix_len > best.prefix_len {
            best = candidate;
        }
    }
    best
}

/// Plan a pattern against a fixed index order.
#[must_use]
pub fn plan_for_order(pattern: &Pattern, order: IndexOrder) -> QueryPlan {
    let positions = order.positions();
    let prefix_len = positions
        .iter()
        .take_while(|position| pattern.is_bound(**position))
        .count();
    let residual = positions[prefix_len..]
        .iter()
        .copied()
        .filter(|position| pattern.is_bound(*position))
        .collect();
    QueryPlan {
        order,
        prefix_len,
        residual,
    }
}
