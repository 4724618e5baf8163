// tests/test_batch_operations.rs
//
// Copy / move / delete batches over the in-memory store.

mod common;

use anyhow::Result;
use common::{seeded_store, slow_store, sorted, tools_for, BUCKET};
use s3tools::{
    count_failures, BatchOptions, CopyPrefixOptions, DeleteOptions, DeleteReport, FnProgress,
    ObjectStore, Outcome, S3ToolsError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn test_copy_keys_returns_one_outcome_per_pair() -> Result<()> {
    let sources: Vec<String> = (0..10).map(|i| format!("src/{i}")).collect();
    let refs: Vec<&str> = sources.iter().map(String::as_str).collect();
    let store = seeded_store(&refs).await;
    let tools = tools_for(&store);

    let destinations: Vec<String> = (0..10).map(|i| format!("dst/{i}")).collect();
    let items = tools
        .copy_keys(BUCKET, sources.clone(), BUCKET, destinations.clone(), &BatchOptions::default())
        .await?;

    assert_eq!(items.len(), 10);
    let identities: HashSet<(String, String)> = items.iter().map(|i| i.identity.clone()).collect();
    let expected: HashSet<(String, String)> = sources.into_iter().zip(destinations).collect();
    assert_eq!(identities, expected);
    assert!(items.iter().all(|i| i.outcome == Outcome::Success(())));
    let body = store.get_object(BUCKET, "dst/7").await?;
    assert_eq!(&body[..], b"src/7");
    Ok(())
}

#[tokio::test]
async fn test_length_mismatch_and_empty_lists_run_nothing() {
    let store = seeded_store(&["a", "b"]).await;
    let tools = tools_for(&store);
    let before = store.call_count();

    let err = tools
        .copy_keys(BUCKET, vec!["a", "b"], BUCKET, vec!["c"], &BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, S3ToolsError::LengthMismatch { sources: 2, destinations: 1 }));

    let err = tools
        .move_keys(BUCKET, Vec::<&str>::new(), BUCKET, Vec::<&str>::new(), &BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, S3ToolsError::EmptyBatch));

    assert_eq!(store.call_count(), before);
    assert_eq!(store.keys(BUCKET), vec!["a", "b"]);
}

#[tokio::test]
async fn test_one_failing_unit_does_not_affect_the_others() -> Result<()> {
    let store = seeded_store(&["k1", "k2", "k3"]).await;
    let tools = tools_for(&store);

    let items = tools
        .copy_keys(
            BUCKET,
            vec!["k1", "missing", "k3"],
            BUCKET,
            vec!["c1", "c2", "c3"],
            &BatchOptions::default().with_concurrency(2),
        )
        .await?;

    assert_eq!(items.len(), 3);
    assert_eq!(count_failures(&items), 1);
    let failed = items
        .iter()
        .find(|i| i.identity.0 == "missing")
        .expect("outcome for missing key");
    let msg = failed.outcome.failure().expect("failure outcome");
    assert!(!msg.is_empty());
    assert!(msg.contains("missing"));
    assert_eq!(sorted(store.keys(BUCKET)), vec!["c1", "c3", "k1", "k2", "k3"]);
    Ok(())
}

#[tokio::test]
async fn test_move_four_pairs() -> Result<()> {
    let store = seeded_store(&["in/1", "in/2", "in/3", "in/4"]).await;
    store.create_bucket("archive", None).await?;
    let tools = tools_for(&store);

    let items = tools
        .move_keys(
            BUCKET,
            vec!["in/1", "in/2", "in/3", "in/4"],
            "archive",
            vec!["out/1", "out/2", "out/3", "out/4"],
            &BatchOptions::default(),
        )
        .await?;

    assert_eq!(count_failures(&items), 0);
    assert!(store.keys(BUCKET).is_empty());
    assert_eq!(store.keys("archive"), vec!["out/1", "out/2", "out/3", "out/4"]);
    for i in 1..=4 {
        assert!(!tools.object_exists(BUCKET, format!("in/{i}")).await?);
        assert!(tools.object_exists("archive", format!("out/{i}")).await?);
    }
    Ok(())
}

#[tokio::test]
async fn test_move_object_single() -> Result<()> {
    let store = seeded_store(&["a.txt"]).await;
    let tools = tools_for(&store);
    tools.move_object(BUCKET, "a.txt", BUCKET, "b/a.txt").await?;
    assert_eq!(store.keys(BUCKET), vec!["b/a.txt"]);

    let err = tools.move_object(BUCKET, "a.txt", BUCKET, "c.txt").await.unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_copy_prefix_with_change_prefix_and_filter() -> Result<()> {
    let store = seeded_store(&["raw/a.csv", "raw/b.json", "raw/sub/c.csv", "other/d.csv"]).await;
    let tools = tools_for(&store);

    let opts = CopyPrefixOptions::default()
        .with_change_prefix("raw", "clean")
        .with_filter("*.csv");
    let items = tools
        .copy_prefix(BUCKET, "raw", BUCKET, &opts, &BatchOptions::default())
        .await?;
    assert_eq!(items.len(), 2);
    assert_eq!(
        sorted(store.keys(BUCKET)),
        vec!["clean/a.csv", "clean/sub/c.csv", "other/d.csv", "raw/a.csv", "raw/b.json", "raw/sub/c.csv"]
    );

    let before = store.call_count();
    let err = tools
        .copy_prefix(BUCKET, "nothing-here", BUCKET, &opts, &BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, S3ToolsError::EmptyBatch));
    // Only the listing call was made.
    assert_eq!(store.call_count(), before + 1);
    Ok(())
}

#[tokio::test]
async fn test_move_prefix_into_other_bucket() -> Result<()> {
    let store = seeded_store(&["tmp/1", "tmp/2", "keep"]).await;
    store.create_bucket("dst", None).await?;
    let tools = tools_for(&store);

    let items = tools
        .move_prefix(BUCKET, "tmp", "dst", &CopyPrefixOptions::default(), &BatchOptions::default())
        .await?;
    assert_eq!(items.len(), 2);
    assert_eq!(store.keys(BUCKET), vec!["keep"]);
    assert_eq!(store.keys("dst"), vec!["tmp/1", "tmp/2"]);

    let err = tools
        .move_prefix(BUCKET, "tmp", "dst", &CopyPrefixOptions::default(), &BatchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, S3ToolsError::EmptyBatch));
    assert_eq!(store.keys(BUCKET), vec!["keep"]);
    Ok(())
}

#[tokio::test]
async fn test_concurrency_cap_is_observed_by_the_store() -> Result<()> {
    let keys: Vec<String> = (0..24).map(|i| format!("k/{i}")).collect();
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let store = slow_store(&refs).await;
    let tools = tools_for(&store);

    let opts = DeleteOptions::execute().with_batch(BatchOptions::default().with_concurrency(4));
    let report = tools.delete_keys(BUCKET, keys.clone(), &opts).await?;
    match report {
        DeleteReport::Deleted(items) => assert_eq!(items.len(), 24),
        DeleteReport::DryRun(_) => panic!("expected a real delete"),
    }
    assert!(store.peak_in_flight() <= 4);
    assert!(store.keys(BUCKET).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_progress_reaches_total() -> Result<()> {
    let keys: Vec<String> = (0..15).map(|i| format!("p/{i}")).collect();
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    let store = seeded_store(&refs).await;
    let tools = tools_for(&store);

    let last = Arc::new(AtomicU64::new(0));
    let totals = Arc::new(Mutex::new(HashSet::new()));
    let sink = {
        let last = last.clone();
        let totals = totals.clone();
        Arc::new(FnProgress::new(move |done, total| {
            last.fetch_max(done, Ordering::SeqCst);
            totals.lock().unwrap().insert(total);
        }))
    };
    let opts = BatchOptions::default().with_concurrency(3).with_progress(sink);

    // Two of the sources are missing: failures count as completions too.
    let mut sources = keys.clone();
    sources[3] = "gone/1".into();
    sources[9] = "gone/2".into();
    let destinations: Vec<String> = (0..15).map(|i| format!("q/{i}")).collect();
    let items = tools.copy_keys(BUCKET, sources, BUCKET, destinations, &opts).await?;

    assert_eq!(items.len(), 15);
    assert_eq!(count_failures(&items), 2);
    assert_eq!(last.load(Ordering::SeqCst), 15);
    assert_eq!(*totals.lock().unwrap(), HashSet::from([15]));
    Ok(())
}

#[tokio::test]
async fn test_delete_dry_run_then_execute() -> Result<()> {
    let store = seeded_store(&["x/1", "x/2", "y/1"]).await;
    let tools = tools_for(&store);

    let report = tools.delete_keys(BUCKET, ["x/1", "y/1"], &DeleteOptions::default()).await?;
    assert_eq!(report, DeleteReport::DryRun(vec!["x/1".into(), "y/1".into()]));
    assert_eq!(store.keys(BUCKET).len(), 3);

    tools.delete_object(BUCKET, "x/2").await?;
    // Deleting an absent key is not an error.
    tools.delete_object(BUCKET, "x/2").await?;
    let report = tools.delete_prefix(BUCKET, "x", &DeleteOptions::execute()).await?;
    assert_eq!(report.keys(), vec!["x/1"]);
    assert_eq!(store.keys(BUCKET), vec!["y/1"]);
    Ok(())
}
