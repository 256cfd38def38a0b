use std::num::NonZero;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::{iter, mem};

/// Pre-warmed worker threads that benchmark calls are dispatched onto.
///
/// Creating threads is not free, so a [`Benchmark`][crate::Benchmark] creates its pool once and
/// reuses the same threads for the warmup and the measured run.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use call_bench::WorkerPool;
///
/// let pool = WorkerPool::new(NonZero::new(4).unwrap());
/// assert_eq!(pool.thread_count().get(), 4);
/// ```
///
/// # Lifecycle
///
/// Dropping the pool will wait for all threads to finish executing their tasks.
#[derive(Debug)]
pub struct WorkerPool {
    command_txs: Vec<mpsc::Sender<Command>>,
    join_handles: Vec<JoinHandle<()>>,
    thread_count: NonZero<usize>,
}

impl WorkerPool {
    /// Creates a pool with the given number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to create a thread.
    #[must_use]
    pub fn new(thread_count: NonZero<usize>) -> Self {
        let (command_txs, join_handles): (Vec<_>, Vec<_>) = (0..thread_count.get())
            .map(|index| {
                let (tx, rx) = mpsc::channel();

                let join_handle = thread::Builder::new()
                    .name(format!("call-bench-worker-{index}"))
                    .spawn(move || worker_entrypoint(&rx))
                    .expect("the operating system must allow creating benchmark worker threads");

                (tx, join_handle)
            })
            .unzip();

        Self {
            command_txs,
            join_handles,
            thread_count,
        }
    }

    /// Returns the number of threads in the pool.
    #[must_use]
    pub fn thread_count(&self) -> NonZero<usize> {
        self.thread_count
    }

    /// Executes a task on all threads in the pool, waiting for all threads to complete
    /// and returning one result per thread.
    ///
    /// # Panics
    ///
    /// Panics if the task panicked on any thread. This only happens after every other thread
    /// has finished the task.
    #[cfg_attr(test, mutants::skip)] // If work does not get enqueued, deadlocks are very easy.
    #[expect(
        clippy::needless_pass_by_ref_mut,
        reason = "protects users from deadlock through concurrent usage"
    )]
    pub(crate) fn execute_task<'f, F, R>(&mut self, f: F) -> Box<[R]>
    where
        F: FnOnce() -> R + Clone + Send + 'f,
        R: Send + 'static,
    {
        // Two concurrent users of the same pool would each wait for threads that are busy
        // with the other user's task, so we demand exclusive access.

        let mut results = Vec::with_capacity(self.thread_count.get());

        let (mut result_txs, result_rxs): (Vec<_>, Vec<_>) =
            iter::repeat_with(oneshot::channel::<R>)
                .take(self.thread_count.get())
                .unzip();

        for tx in &self.command_txs {
            let f: Box<dyn FnOnce() -> R + Send + 'f> = Box::new(f.clone());

            // SAFETY: We wait below for every thread to report its result before returning,
            // so everything borrowed for 'f outlives the execution of the task. The 'static
            // lifetime only exists to satisfy the channel type.
            let f = unsafe {
                mem::transmute::<
                    Box<dyn FnOnce() -> R + Send + 'f>,
                    Box<dyn FnOnce() -> R + Send + 'static>,
                >(f)
            };

            let result_tx = result_txs
                .pop()
                .expect("type invariant - one command_tx per thread");

            tx.send(Command::Execute(Box::new(move || {
                let result = f();

                result_tx
                    .send(result)
                    .expect("receiver must still exist - this is mandatory for scoped lifetime logic");
            })))
            .expect("worker thread must still exist - the pool cannot operate without workers");
        }

        // A worker that panics drops its sender. The others may still be running the task and
        // borrowing from 'f, so we hear from every worker before panicking ourselves.
        let mut panicked_workers: usize = 0;

        for rx in result_rxs {
            match rx.recv() {
                Ok(result) => results.push(result),
                Err(_disconnected) => panicked_workers = panicked_workers.saturating_add(1),
            }
        }

        assert!(
            panicked_workers == 0,
            "{panicked_workers} worker thread(s) panicked while executing a task"
        );

        results.into_boxed_slice()
    }
}

impl Drop for WorkerPool {
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn drop(&mut self) {
        if thread::panicking() {
            // Shutting down may hide the original panic behind a second one.
            return;
        }

        for tx in self.command_txs.drain(..) {
            // A worker that already exited has nothing left to shut down.
            drop(tx.send(Command::Shutdown));
        }

        for handle in self.join_handles.drain(..) {
            drop(handle.join());
        }
    }
}

enum Command {
    Execute(Box<dyn FnOnce() + Send>),
    Shutdown,
}

#[cfg_attr(test, mutants::skip)] // Impractical to test that things do not happen when worker function is missing.
fn worker_entrypoint(rx: &mpsc::Receiver<Command>) {
    while let Ok(Command::Execute(f)) = rx.recv() {
        f();
    }
}
