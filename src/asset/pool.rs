//! Bounded worker pool for independent downloads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Apply `f` to every item on at most `max_workers` scoped threads.
///
/// Results come back in item order regardless of completion order, so the
/// output is identical to a sequential map.
pub(crate) fn map_bounded<T, R, F>(items: &[T], max_workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = max_workers.min(items.len());
    if workers <= 1 {
        return items.iter().map(f).collect();
    }

    let next = AtomicUsize::new(0);
    let mut slots: Vec<Option<R>> = items.iter().map(|_| None).collect();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(item) = items.get(index) else {
                            break;
                        };
                        done.push((index, f(item)));
                    }
                    done
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (index, result) in done {
                        slots[index] = Some(result);
                    }
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_map_preserves_order() {
        let items: Vec<u64> = (0..100).collect();
        let out = map_bounded(&items, 8, |n| {
            thread::sleep(std::time::Duration::from_micros(100 - *n));
            n * 2
        });
        assert_eq!(out, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_sequential_when_single_worker() {
        let items = vec!["a", "b"];
        assert_eq!(map_bounded(&items, 0, |s| s.to_uppercase()), vec!["A", "B"]);
        assert_eq!(map_bounded(&items, 1, |s| s.len()), vec![1, 1]);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u8> = Vec::new();
        assert!(map_bounded(&items, 4, |b| *b).is_empty());
    }
}
