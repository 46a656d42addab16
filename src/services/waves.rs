//! Bounded-concurrency wave execution.
//!
//! Both schedulers share the same "process N at a time" primitive: split the
//! work into consecutive waves of at most `wave_size` items, run one wave
//! fully concurrently, and only then start the next.

use std::future::Future;

use futures::future::join_all;

/// Splits items into consecutive waves of at most `wave_size` each,
/// preserving order. A `wave_size` of zero is treated as one.
pub fn split_into_waves<T>(items: Vec<T>, wave_size: usize) -> Vec<Vec<T>> {
    let wave_size = wave_size.max(1);
    let mut waves = Vec::with_capacity(items.len().div_ceil(wave_size));
    let mut items = items.into_iter();
    loop {
        let wave: Vec<T> = items.by_ref().take(wave_size).collect();
        if wave.is_empty() {
            break;
        }
        waves.push(wave);
    }
    waves
}

/// Runs `work` over every item with at most `wave_size` calls in flight.
///
/// The next wave does not start until every member of the current wave has
/// finished. `work` futures must own their data and never fail; failure
/// isolation is the caller's concern.
pub async fn run_in_waves<T, F, Fut>(items: Vec<T>, wave_size: usize, mut work: F)
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    for wave in split_into_waves(items, wave_size) {
        join_all(wave.into_iter().map(&mut work)).await;
    }
}
