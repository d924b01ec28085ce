//! Canned responses used when the completion API is unavailable

use std::time::Duration;

use rand::Rng;

use crate::reveal::{reveal, CancelToken, ProgressFn, FALLBACK_STEP};

/// Fixed demo responses, selected uniformly at random on every call.
pub const FALLBACK_RESPONSES: [&str; 3] = [
    "To work through this development problem, let's start by analyzing the structure of the code. I recommend checking how the dependencies are managed first, then examining the data-flow logic.",
    "This error is common in development. A few steps to debug it: 1) Check the error logs, 2) Isolate the failing component, 3) Test again with simplified input data.",
    "To optimize this part of the code, we could take a more declarative approach. Consider array methods such as map, filter, or reduce instead of hand-written loops.",
];

/// Pick a canned response and, when a progress callback is supplied, replay
/// it through the reveal simulator at the fallback step delay before
/// returning.
///
/// Selection is independent on every call; repeats are expected.
pub async fn fallback(cancel: &CancelToken, on_progress: Option<ProgressFn>) -> String {
    fallback_with_step(FALLBACK_STEP, cancel, on_progress).await
}

async fn fallback_with_step(
    step: Duration,
    cancel: &CancelToken,
    mut on_progress: Option<ProgressFn>,
) -> String {
    let index = rand::thread_rng().gen_range(0..FALLBACK_RESPONSES.len());
    let response = FALLBACK_RESPONSES[index];

    if let Some(on_tick) = on_progress.as_mut() {
        reveal(response, step, cancel, |prefix| on_tick(prefix)).await;
    }

    response.to_string()
}
