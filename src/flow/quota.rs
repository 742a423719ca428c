//! Even split of a deficit over a node's edges
//!
//! `amount / parts` goes to every edge and the first `amount % parts` edges
//! (in node order) get one more unit. Increments sum to `amount` exactly and
//! never differ by more than one.

/// Per-edge increments for spreading `amount` over `parts` edges
///
/// Yields nothing when `parts == 0`.
pub fn split_evenly(amount: u64, parts: usize) -> impl Iterator<Item = u64> {
    let (quota, remainder) = if parts == 0 {
        (0, 0)
    } else {
        (amount / parts as u64, amount % parts as u64)
    };

    (0..parts as u64).map(move |i| quota + u64::from(i < remainder))
}
