//! # Row Worker Pool
//!
//! Bounded parallel map over a range of row indices.
//!
//! Each call builds a rayon pool with exactly `workers` threads, splits the
//! requested rows of the output buffer into disjoint `&mut` chunks and hands
//! every row to one worker. `install` returns only once every row job has
//! finished, so the buffer is never observed while a pass is still writing it.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::warn;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::ComputeError;

/// Point in time after which workers stop starting new rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No limit.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn after(limit: Duration) -> Self {
        Self(Instant::now().checked_add(limit))
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

/// Run `f(y, row)` for every `y` in `rows`, spread over `workers` threads.
///
/// `buf` is a row-major buffer with rows of `width` elements. Rows outside
/// `rows` are left untouched. `workers == 0` is treated as one worker.
///
/// The deadline is checked before each row starts; a row already running
/// always completes.
///
/// # Errors
/// - [`ComputeError::DeadlineExceeded`] if at least one row was skipped
///   because the deadline had passed. The buffer is then partially written.
/// - [`ComputeError::Pool`] if the worker threads could not be started.
pub fn for_each_row<T, F>(
    buf: &mut [T],
    width: usize,
    rows: Range<usize>,
    workers: usize,
    deadline: Deadline,
    f: F,
) -> Result<(), ComputeError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    let end = rows.end.min(buf.len() / width.max(1));
    if width == 0 || rows.start >= end {
        return Ok(());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()?;
    let skipped = AtomicBool::new(false);

    pool.install(|| {
        buf[rows.start * width..end * width]
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| {
                if deadline.expired() {
                    skipped.store(true, Ordering::Relaxed);
                    return;
                }
                f(rows.start + i, row);
            });
    });

    if skipped.load(Ordering::Relaxed) {
        warn!("⏱️ Row pass stopped early: deadline exceeded");
        return Err(ComputeError::DeadlineExceeded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_every_row_in_range_visited_once() {
        let width = 4;
        let mut buf = vec![0u32; width * 10];
        let visits = AtomicUsize::new(0);

        for_each_row(&mut buf, width, 2..8, 3, Deadline::none(), |y, row| {
            visits.fetch_add(1, Ordering::Relaxed);
            for cell in row.iter_mut() {
                *cell += y as u32 + 1;
            }
        })
        .unwrap();

        assert_eq!(visits.load(Ordering::Relaxed), 6);
        for (y, row) in buf.chunks(width).enumerate() {
            let expected = if (2..8).contains(&y) { y as u32 + 1 } else { 0 };
            assert!(row.iter().all(|&v| v == expected), "row {}", y);
        }
    }

    #[test]
    fn test_pool_uses_requested_worker_count() {
        let mut buf = vec![0u8; 3 * 16];
        let threads = std::sync::Mutex::new(std::collections::HashSet::new());
        for_each_row(&mut buf, 3, 0..16, 2, Deadline::none(), |_, row| {
            threads.lock().unwrap().insert(thread::current().id());
            thread::sleep(Duration::from_millis(2));
            row.fill(1);
        })
        .unwrap();
        assert!(threads.lock().unwrap().len() <= 2);
        assert!(buf.iter().all(|&v| v == 1));
    }

    #[test]
    fn test_zero_workers_still_processes() {
        let mut buf = vec![0u8; 9];
        for_each_row(&mut buf, 3, 0..3, 0, Deadline::none(), |_, row| row.fill(7)).unwrap();
        assert!(buf.iter().all(|&v| v == 7));
    }

    #[test]
    fn test_more_workers_than_rows() {
        let mut buf = vec![0u8; 6];
        for_each_row(&mut buf, 3, 1..2, 64, Deadline::none(), |_, row| row.fill(1)).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_empty_range_is_noop() {
        let mut buf = vec![5u8; 6];
        for_each_row(&mut buf, 3, 1..1, 4, Deadline::none(), |_, row| row.fill(0)).unwrap();
        assert!(buf.iter().all(|&v| v == 5));
    }

    #[test]
    fn test_expired_deadline_reports_error() {
        let mut buf = vec![0u8; 30];
        let past = Deadline::at(Instant::now());
        let result = for_each_row(&mut buf, 3, 0..10, 2, past, |_, row| row.fill(1));
        assert!(matches!(result, Err(ComputeError::DeadlineExceeded)));
    }

    #[test]
    fn test_finished_pass_is_ok_even_if_deadline_passes_during_last_row() {
        let mut buf = vec![0u8; 3];
        let deadline = Deadline::after(Duration::from_millis(30));
        let result = for_each_row(&mut buf, 3, 0..1, 1, deadline, |_, row| {
            thread::sleep(Duration::from_millis(80));
            row.fill(1);
        });
        assert!(result.is_ok());
        assert_eq!(buf, vec![1, 1, 1]);
    }
}
