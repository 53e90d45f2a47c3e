//! PostgresSquareStore against a real database.
//!
//! Requires Docker. Run with:
//!   cargo test --test postgres_store_tests -- --ignored --test-threads=1

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use grid_core::common::GridLayout;
use grid_core::domains::rotation::{RotationEngine, StatsReporter};
use grid_core::domains::squares::{
    PageAssignment, SquareMove, SquareStore, SquareStatus, StoreError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use test_context::test_context;

use common::*;

/// Insert and confirm a record through the public store API.
async fn insert_active(store: &dyn SquareStore, square: u32) -> uuid::Uuid {
    let now = Utc::now();
    let record = active_record(square, now);
    let pending = store.insert_pending(record, now).await.unwrap();
    store.confirm_payment(pending.id).await.unwrap();
    pending.id
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn rotation_permutes_page_occupants(ctx: &mut TestHarness) {
    let store = Arc::new(ctx.store());
    for square in [1, 2, 3, 4, 5, 250] {
        insert_active(&*store, square).await;
    }

    let engine = RotationEngine::new(store.clone(), GridLayout::default())
        .with_rng(StdRng::seed_from_u64(12));
    let result = engine.rotate(Utc::now()).await.unwrap();
    assert!(result.failed_pages.is_empty());

    let page_one: HashSet<u32> = store
        .list_squares(1..=200)
        .await
        .unwrap()
        .iter()
        .map(|r| r.square_number)
        .collect();
    assert_eq!(page_one, HashSet::from([1, 2, 3, 4, 5]));

    let stats = StatsReporter::new(store, std::time::Duration::from_secs(7200))
        .report()
        .await
        .unwrap();
    assert_eq!(stats.total_purchases, 6);
    assert_eq!(stats.shuffled_purchases, result.moved_count as u64);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn swaps_commit_under_the_uniqueness_constraint(ctx: &mut TestHarness) {
    let store = ctx.store();
    let a = insert_active(&store, 10).await;
    let b = insert_active(&store, 20).await;

    let assignment = PageAssignment {
        page: 1,
        occupied: vec![10, 20],
        moves: vec![
            SquareMove { record_id: a, from: 10, to: 20 },
            SquareMove { record_id: b, from: 20, to: 10 },
        ],
    };
    store.apply_page_assignment(&assignment, Utc::now()).await.unwrap();

    assert_eq!(store.find_by_id(a).await.unwrap().unwrap().square_number, 20);
    assert_eq!(store.find_by_id(b).await.unwrap().unwrap().square_number, 10);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn stale_assignment_is_rolled_back(ctx: &mut TestHarness) {
    let store = ctx.store();
    let a = insert_active(&store, 10).await;
    let b = insert_active(&store, 20).await;

    let assignment = PageAssignment {
        page: 1,
        occupied: vec![10, 20],
        moves: vec![
            SquareMove { record_id: a, from: 10, to: 20 },
            SquareMove { record_id: b, from: 20, to: 10 },
        ],
    };
    // A purchase lands on the page between read and write
    insert_active(&store, 30).await;

    let err = store
        .apply_page_assignment(&assignment, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::OccupancyChanged { page: 1 }));
    assert_eq!(store.find_by_id(a).await.unwrap().unwrap().square_number, 10);
    assert_eq!(store.find_by_id(b).await.unwrap().unwrap().square_number, 20);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn occupied_square_is_refused_until_it_expires(ctx: &mut TestHarness) {
    let store = ctx.store();
    let now = Utc::now();

    let mut short = active_record(99, now);
    short.expires_at = now + Duration::seconds(1);
    let short = store.insert_pending(short, now).await.unwrap();

    let err = store
        .insert_pending(active_record(99, now), now)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::SquareOccupied(99)));

    // Past the first record's expiry the square is free again
    let later = now + Duration::seconds(5);
    let mut next = active_record(99, later);
    next.purchased_at = later;
    store.insert_pending(next, later).await.unwrap();

    let retired = store.find_by_id(short.id).await.unwrap().unwrap();
    assert!(retired.retired_at.is_some());
    assert_eq!(
        grid_core::domains::squares::status(&retired, later),
        SquareStatus::Expired
    );
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore]
async fn empty_table_stats_are_zero(ctx: &mut TestHarness) {
    let stats = ctx.store().stats().await.unwrap();
    assert_eq!(stats.total_records, 0);
    assert_eq!(stats.shuffled_records, 0);
    assert_eq!(stats.last_shuffled_at, None);
}
