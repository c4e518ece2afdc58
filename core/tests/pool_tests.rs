use index_core::{PoolError, Spawner, WorkerPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn finish_drains_tasks_submitted_by_tasks() {
    let pool = WorkerPool::new(4);
    let completed = Arc::new(AtomicUsize::new(0));
    let spawner = pool.spawner();

    let counter = Arc::clone(&completed);
    pool.execute(move || {
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            spawner
                .execute(move || {
                    std::thread::sleep(std::time::Duration::from_millis(10));
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    pool.finish();
    assert_eq!(completed.load(Ordering::SeqCst), 4);
    assert_eq!(pool.pending(), 0);
}

fn chain(spawner: Spawner, depth: usize, counter: Arc<AtomicUsize>) {
    counter.fetch_add(1, Ordering::SeqCst);
    if depth == 0 {
        return;
    }
    for _ in 0..2 {
        let next = spawner.clone();
        let counter = Arc::clone(&counter);
        spawner.execute(move || chain(next, depth - 1, counter)).unwrap();
    }
}

#[test]
fn finish_drains_chained_submissions() {
    let pool = WorkerPool::new(3);
    let completed = Arc::new(AtomicUsize::new(0));
    let spawner = pool.spawner();
    let counter = Arc::clone(&completed);
    pool.execute(move || chain(spawner, 5, counter)).unwrap();
    pool.finish();
    // full binary tree of depth 5
    assert_eq!(completed.load(Ordering::SeqCst), 63);
}

#[test]
fn pool_is_reusable_across_finishes() {
    let pool = WorkerPool::new(2);
    let completed = Arc::new(AtomicUsize::new(0));
    for round in 1..=3 {
        for _ in 0..10 {
            let completed = Arc::clone(&completed);
            pool.execute(move || {
                completed.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.finish();
        assert_eq!(completed.load(Ordering::SeqCst), round * 10);
    }
}

#[test]
fn shutdown_drains_then_rejects() {
    let pool = WorkerPool::new(2);
    let completed = Arc::new(AtomicUsize::new(0));
    for _ in 0..20 {
        let completed = Arc::clone(&completed);
        pool.execute(move || {
            completed.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    pool.join();
    assert_eq!(completed.load(Ordering::SeqCst), 20);
    assert_eq!(pool.spawner().execute(|| {}), Err(PoolError::ShutDown));
}
