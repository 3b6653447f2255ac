//! Multi-threaded tests for the TCB table and the kernel id handshake

use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use uthread::collections::HashTable;
use uthread::thread::TcbOps;
use uthread::{Kernel, KernelTid, StackBounds, Task, Tcb, ThreadConfig, ThreadId, PAGE_SIZE};

const ROOT_STACK: StackBounds = StackBounds::new(0x7000_0000, 0x7010_0000);

/// Kernel that hands out a fresh id on every query and counts queries
#[derive(Default)]
struct CountingKernel {
    calls: AtomicUsize,
    next: AtomicI32,
}

impl CountingKernel {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Kernel for CountingKernel {
    fn gettid(&self) -> KernelTid {
        self.calls.fetch_add(1, Ordering::SeqCst);
        KernelTid(1000 + self.next.fetch_add(1, Ordering::SeqCst))
    }
}

fn tcb(id: u32) -> Arc<Tcb> {
    let low = id as usize * 2 * PAGE_SIZE;
    Arc::new(Tcb::new(ThreadId(id), StackBounds::new(low, low + PAGE_SIZE)))
}

#[test]
fn colliding_ids_in_four_buckets() {
    let table = HashTable::init(4, TcbOps).unwrap();
    for id in [1, 2, 3, 5] {
        table.insert(tcb(id));
    }
    assert_eq!(table.bucket_index(&ThreadId(1)), 1);
    assert_eq!(table.bucket_index(&ThreadId(5)), 1);

    let removed = table.remove(&ThreadId(1)).unwrap();
    assert_eq!(removed.library_tid(), ThreadId(1));

    assert_eq!(table.lookup(&ThreadId(5)).unwrap().library_tid(), ThreadId(5));
    assert!(table.lookup(&ThreadId(1)).is_none());
    assert_eq!(table.len(), 3);
}

#[test]
fn different_buckets_do_not_contend() {
    let table = HashTable::init(4, TcbOps).unwrap();
    table.insert(tcb(1));

    let (entered_tx, entered_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    thread::scope(|s| {
        // Park inside bucket 1 with its lock held
        s.spawn(|| {
            table.with(&ThreadId(1), move |_| {
                entered_tx.send(()).unwrap();
                done_rx.recv().unwrap();
            });
        });

        entered_rx.recv().unwrap();
        assert!(table.bucket_is_locked(1));

        // Bucket 2 is free while bucket 1 is held
        table.insert(tcb(2));
        assert!(table.lookup(&ThreadId(2)).is_some());
        assert!(table.bucket_is_locked(1));
        assert!(!table.bucket_is_locked(2));

        done_tx.send(()).unwrap();
    });

    assert_eq!(table.len(), 2);
}

#[test]
fn same_bucket_caller_waits_for_with() {
    let table = HashTable::init(4, TcbOps).unwrap();
    table.insert(tcb(1));

    let (entered_tx, entered_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let inserted = AtomicUsize::new(0);

    thread::scope(|s| {
        s.spawn(|| {
            table.with(&ThreadId(1), move |_| {
                entered_tx.send(()).unwrap();
                done_rx.recv().unwrap();
            });
        });
        entered_rx.recv().unwrap();

        // Id 5 maps to the held bucket, so this blocks until `with` returns
        let contender = s.spawn(|| {
            table.insert(tcb(5));
            inserted.store(1, Ordering::SeqCst);
        });

        thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(inserted.load(Ordering::SeqCst), 0);
        assert!(table.bucket_is_locked(1));

        done_tx.send(()).unwrap();
        contender.join().unwrap();
        assert_eq!(inserted.load(Ordering::SeqCst), 1);
    });

    assert!(table.lookup(&ThreadId(5)).is_some());
    assert!(!table.bucket_is_locked(1));
}

#[test]
fn concurrent_inserts_all_land() {
    let table = HashTable::init(8, TcbOps).unwrap();

    thread::scope(|s| {
        for t in 0..4u32 {
            let table = &table;
            s.spawn(move || {
                for i in 0..100 {
                    table.insert(tcb(t * 100 + i));
                }
            });
        }
    });

    assert_eq!(table.len(), 400);
    for id in 0..400 {
        let found = table.lookup(&ThreadId(id)).unwrap();
        assert_eq!(found.library_tid(), ThreadId(id));
    }
}

#[test]
fn kernel_tid_resolved_once_for_all_waiters() {
    const WAITERS: usize = 7;

    let kernel = Arc::new(CountingKernel::default());
    let task = Task::init(ThreadConfig::new(), Arc::clone(&kernel), ROOT_STACK).unwrap();
    // Root id is resolved during init
    assert_eq!(kernel.calls(), 1);

    let child = task.register_thread().unwrap();
    let tid = child.library_tid();

    let seen: Vec<KernelTid> = thread::scope(|s| {
        let waiters: Vec<_> = (0..WAITERS)
            .map(|_| s.spawn(|| task.kernel_tid_of(tid)))
            .collect();

        let owner = s.spawn(|| {
            let mine = task.my_kernel_tid(&child);
            // Asking again must not query the kernel
            assert_eq!(task.my_kernel_tid(&child), mine);
            mine
        });

        let mut seen: Vec<KernelTid> = waiters.into_iter().map(|w| w.join().unwrap()).collect();
        seen.push(owner.join().unwrap());
        seen
    });

    assert_eq!(seen.len(), WAITERS + 1);
    assert!(seen.iter().all(|&k| k == seen[0]));
    assert_eq!(child.kernel_tid(), Some(seen[0]));
    assert_eq!(kernel.calls(), 2);
}

#[test]
fn concurrent_registration_gives_unique_ids() {
    let task = Task::init(ThreadConfig::new().with_tcb_buckets(16), uthread::HostKernel, ROOT_STACK).unwrap();

    let ids: Vec<ThreadId> = thread::scope(|s| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    (0..50)
                        .map(|_| task.register_thread().unwrap().library_tid())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
    });

    let unique: HashSet<ThreadId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 400);
    assert!(!unique.contains(&ThreadId::ROOT));
    assert_eq!(task.thread_count(), 401);
}

#[test]
fn child_lifecycle_across_threads() {
    let kernel = Arc::new(CountingKernel::default());
    let task = Task::init(ThreadConfig::new(), Arc::clone(&kernel), ROOT_STACK).unwrap();

    let children: Vec<Arc<Tcb>> = (0..4).map(|_| task.register_thread().unwrap()).collect();

    thread::scope(|s| {
        for child in &children {
            let task = &task;
            s.spawn(move || {
                task.my_kernel_tid(child);
                let value = child.library_tid().0 as usize * 10;
                task.exit(child, value);
            });
        }

        for child in &children {
            let tid = child.library_tid();
            assert_eq!(task.join(tid), Ok(tid.0 as usize * 10));
        }
    });

    assert_eq!(task.thread_count(), 1);
    assert_eq!(task.stacks().free_count(), 4);
    assert_eq!(kernel.calls(), 5);
    assert_eq!(task.shutdown(), 1);
}
