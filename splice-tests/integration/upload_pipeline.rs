//! End-to-end pipeline tests through the core components.
//!
//! Exercises the chunk store, session tracker, and reassembly engine wired
//! together the way the server wires them, without the HTTP layer.

use std::sync::Arc;

use splice_core::config::SpliceConfig;
use splice_core::session::{InMemorySessionTracker, SessionTracker};
use splice_core::storage::{ChunkStore, FileChunkStore};
use splice_core::{AssemblyError, ReassemblyEngine};

struct Pipeline {
    store: Arc<FileChunkStore>,
    tracker: Arc<InMemorySessionTracker>,
    engine: Arc<ReassemblyEngine>,
    _temp: tempfile::TempDir,
}

fn pipeline() -> Pipeline {
    let temp = tempfile::tempdir().unwrap();
    let config = SpliceConfig::for_testing(temp.path());
    config.storage.ensure_directories().unwrap();

    let store = Arc::new(FileChunkStore::new(&config.storage));
    let tracker = Arc::new(InMemorySessionTracker::new());
    let engine = Arc::new(ReassemblyEngine::new(
        &config.storage,
        Arc::clone(&store) as Arc<dyn ChunkStore>,
        Arc::clone(&tracker) as Arc<dyn SessionTracker>,
    ));

    Pipeline {
        store,
        tracker,
        engine,
        _temp: temp,
    }
}

async fn upload(p: &Pipeline, session: &str, index: u32, bytes: &[u8]) -> usize {
    p.store.put(session, index, bytes).await.unwrap();
    p.tracker.record_chunk(session, index)
}

#[tokio::test]
async fn out_of_order_uploads_assemble_in_index_order() {
    let p = pipeline();

    // Chunks 0,1,2 of sizes 10,20,30 uploaded as 2,0,1
    upload(&p, "s1", 2, &[b'2'; 30]).await;
    upload(&p, "s1", 0, &[b'0'; 10]).await;
    let total = upload(&p, "s1", 1, &[b'1'; 20]).await;
    assert_eq!(total, 3);

    let report = p.engine.finalize("s1", 3).await.unwrap();
    assert_eq!(report.bytes_written, 60);

    let artifact = tokio::fs::read(&report.artifact_path).await.unwrap();
    let mut expected = vec![b'0'; 10];
    expected.extend(vec![b'1'; 20]);
    expected.extend(vec![b'2'; 30]);
    assert_eq!(artifact, expected);

    // Tracker entry and chunk directory are gone afterward
    assert_eq!(p.tracker.active_sessions(), 0);
    assert!(!p.store.chunk_path("s1", 0).parent().unwrap().exists());
}

#[tokio::test]
async fn interleaved_sessions_do_not_cross_contaminate() {
    let p = pipeline();

    upload(&p, "alpha", 0, b"AAAA").await;
    upload(&p, "beta", 0, b"BB").await;
    upload(&p, "alpha", 1, b"aaaa").await;
    upload(&p, "beta", 1, b"bb").await;

    let alpha = p.engine.finalize("alpha", 2).await.unwrap();
    let beta = p.engine.finalize("beta", 2).await.unwrap();

    assert_eq!(tokio::fs::read(&alpha.artifact_path).await.unwrap(), b"AAAAaaaa");
    assert_eq!(tokio::fs::read(&beta.artifact_path).await.unwrap(), b"BBbb");
}

#[tokio::test]
async fn reupload_replaces_contribution() {
    let p = pipeline();

    upload(&p, "s1", 0, b"garbled-first-attempt").await;
    let total = upload(&p, "s1", 0, b"clean").await;
    // Same index twice still counts one chunk
    assert_eq!(total, 1);
    upload(&p, "s1", 1, b"-tail").await;

    let report = p.engine.finalize("s1", 2).await.unwrap();
    let artifact = tokio::fs::read(&report.artifact_path).await.unwrap();
    assert_eq!(artifact, b"clean-tail");
}

#[tokio::test]
async fn concurrent_uploads_one_session_are_all_counted() {
    let p = pipeline();
    let store = Arc::clone(&p.store);
    let tracker = Arc::clone(&p.tracker);

    let mut handles = Vec::new();
    for index in 0u32..20 {
        let store = Arc::clone(&store);
        let tracker = Arc::clone(&tracker);
        handles.push(tokio::spawn(async move {
            let payload = vec![index as u8; 100];
            store.put("burst", index, &payload).await.unwrap();
            tracker.record_chunk("burst", index);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let report = p.engine.finalize("burst", 20).await.unwrap();
    assert_eq!(report.chunks_written, 20);
    assert_eq!(report.bytes_written, 2000);
    assert_eq!(report.missing_chunks, 0);

    // Byte at each kilobyte boundary should match index order
    let artifact = tokio::fs::read(&report.artifact_path).await.unwrap();
    for index in 0..20 {
        assert_eq!(artifact[index * 100], index as u8);
    }
}

#[tokio::test]
async fn finalize_failure_keeps_chunks_for_retry() {
    let p = pipeline();

    // Nothing uploaded: hard error, no mutation
    let err = p.engine.finalize("empty", 4).await.unwrap_err();
    assert!(matches!(err, AssemblyError::NoChunksFound { .. }));

    // Now a session with data: a successful retry after the failed session id
    upload(&p, "retry", 0, b"data").await;
    let report = p.engine.finalize("retry", 1).await.unwrap();
    assert_eq!(report.bytes_written, 4);
}

#[tokio::test]
async fn gap_tolerant_finalize_reports_missing_count() {
    let p = pipeline();

    upload(&p, "gappy", 0, b"begin").await;
    upload(&p, "gappy", 3, b"end").await;

    let report = p.engine.finalize("gappy", 4).await.unwrap();
    assert_eq!(report.chunks_written, 2);
    assert_eq!(report.missing_chunks, 2);

    let artifact = tokio::fs::read(&report.artifact_path).await.unwrap();
    assert_eq!(artifact, b"beginend");
}
