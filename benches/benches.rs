use criterion::black_box;
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use crossbeam::sync::WaitGroup;
use workq::{BlockingQueue, SharedQueueThreadPool, ThreadPool, WorkerPool};

fn queue_benchmark(c: &mut Criterion) {
    let queue = BlockingQueue::new();
    c.bench_function("queue enqueue+dequeue", |b| {
        b.iter(|| {
            queue.enqueue(black_box(1_u64));
            queue.dequeue()
        })
    });

    c.bench_function("queue dequeue_n 64", |b| {
        b.iter(|| {
            for i in 0..64_u64 {
                queue.enqueue(i);
            }
            queue.dequeue_n(black_box(64))
        })
    });
}

fn run_batch<P: ThreadPool>(pool: &P, jobs: usize) {
    let wg = WaitGroup::new();
    for _ in 0..jobs {
        let wg = wg.clone();
        pool.spawn(move || drop(black_box(wg)));
    }
    wg.wait();
}

fn pool_benchmark(c: &mut Criterion) {
    let threads = num_cpus::get() as u32;

    let worker_pool = <WorkerPool as ThreadPool>::new(threads).unwrap();
    c.bench_function("worker pool 1000 jobs", |b| {
        b.iter(|| run_batch(&worker_pool, 1000))
    });
    worker_pool.stop();
    worker_pool.join();

    let shared = SharedQueueThreadPool::new(threads).unwrap();
    c.bench_function("shared queue pool 1000 jobs", |b| {
        b.iter(|| run_batch(&shared, 1000))
    });
}

criterion_group!(benches, queue_benchmark, pool_benchmark);
criterion_main!(benches);
