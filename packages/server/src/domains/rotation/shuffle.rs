//! Page-confined shuffling.
//!
//! Records are permuted, not square numbers: the page's sorted list of
//! occupied squares is dealt out in order to the shuffled records. The result
//! is always a permutation of the page's occupants, so two records can never
//! land on the same square and no square is vacated or newly filled.

use rand::Rng;

use crate::domains::squares::models::square::SquareRecord;
use crate::domains::squares::store::{PageAssignment, SquareMove};

/// Unbiased in-place Fisher–Yates shuffle.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Compute a new layout for one page's active records.
///
/// Only records whose square actually changes appear in `moves`; pages with
/// fewer than two records always produce an empty plan.
pub fn plan_page<R: Rng + ?Sized>(
    page: u32,
    records: &[SquareRecord],
    rng: &mut R,
) -> PageAssignment {
    let mut occupied: Vec<u32> = records.iter().map(|r| r.square_number).collect();
    occupied.sort_unstable();

    let mut order: Vec<&SquareRecord> = records.iter().collect();
    fisher_yates(&mut order, rng);

    let moves = occupied
        .iter()
        .zip(order)
        .filter(|(slot, record)| record.square_number != **slot)
        .map(|(slot, record)| SquareMove {
            record_id: record.id,
            from: record.square_number,
            to: *slot,
        })
        .collect();

    PageAssignment {
        page,
        occupied,
        moves,
    }
}
