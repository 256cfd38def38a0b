use std::num::NonZero;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::WorkerPool;

/// A 1-based number identifying one dispatched call.
///
/// Every ticket in `1..=total_calls` is handed to exactly one worker exactly once.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, derive_more::Display)]
pub struct Ticket(NonZero<u64>);

impl Ticket {
    /// Creates a ticket from its 1-based number.
    #[must_use]
    pub fn new(number: NonZero<u64>) -> Self {
        Self(number)
    }

    /// The 1-based ticket number.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// The 0-based index of the slot that stores the outcome of this ticket.
    #[must_use]
    pub fn slot_index(self) -> usize {
        usize::try_from(self.0.get().saturating_sub(1))
            .expect("slot storage for every ticket was allocated, so the index fits in usize")
    }
}

/// Hands out `total_calls` tickets to every worker of the pool and returns once all tickets
/// have been processed and every worker has stopped claiming.
///
/// There is no queue. Workers share one counter and each claims the next ticket by incrementing
/// it; a worker stops as soon as it claims a ticket beyond `total_calls`. Fast workers therefore
/// take more tickets than slow ones, and no worker owns a fixed range.
///
/// Returns the number of tickets each worker processed. The order of the returned counts
/// carries no meaning.
///
/// A `per_call` that never returns blocks the dispatch forever. Callers that need a deadline
/// must build it into `per_call`.
///
/// # Panics
///
/// `per_call` is expected not to panic. If it does, the panicking worker stops claiming,
/// the remaining workers drain the rest of the tickets and `dispatch` panics once they are
/// done.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// use call_bench::{WorkerPool, dispatch};
///
/// let mut pool = WorkerPool::new(NonZero::new(4).unwrap());
/// let sum = AtomicU64::new(0);
///
/// let per_worker = dispatch(&mut pool, 10, |ticket| {
///     sum.fetch_add(ticket.get(), Ordering::Relaxed);
/// });
///
/// assert_eq!(sum.load(Ordering::Relaxed), 55);
/// assert_eq!(per_worker.iter().sum::<u64>(), 10);
/// ```
pub fn dispatch<F>(pool: &mut WorkerPool, total_calls: u64, per_call: F) -> Box<[u64]>
where
    F: Fn(Ticket) + Sync,
{
    let next_ticket = AtomicU64::new(0);

    let next_ticket = &next_ticket;
    let per_call = &per_call;

    let per_worker = pool.execute_task(move || {
        let mut processed: u64 = 0;

        while let Some(ticket) = claim(next_ticket, total_calls) {
            per_call(ticket);
            processed = processed.saturating_add(1);
        }

        tracing::trace!(processed, "worker found no more tickets to claim");

        processed
    });

    tracing::debug!(
        total_calls,
        workers = per_worker.len(),
        "dispatched all tickets"
    );

    per_worker
}

/// Claims the next ticket, or `None` if all tickets have been handed out.
///
/// Each worker makes at most one claim past the end before it stops, so the counter cannot
/// overflow before every worker has stopped.
fn claim(next_ticket: &AtomicU64, total_calls: u64) -> Option<Ticket> {
    // The read-modify-write is atomic, so no two claims can observe the same previous value.
    let previous = next_ticket.fetch_add(1, Ordering::Relaxed);

    let number = previous.checked_add(1)?;

    if number > total_calls {
        return None;
    }

    NonZero::new(number).map(Ticket::new)
}
