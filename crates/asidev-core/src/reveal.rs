//! Timed reveal of an already-complete response
//!
//! The completion API is always asked for the full answer in one round trip;
//! the typing effect the user sees is produced here by replaying the text as
//! growing character prefixes on a timer. This is a deliberate
//! latency-injecting simulation, not network streaming.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Step delay between characters for primary API responses.
pub const PRIMARY_STEP: Duration = Duration::from_millis(15);

/// Step delay between characters for canned fallback responses.
pub const FALLBACK_STEP: Duration = Duration::from_millis(20);

/// Callback receiving each successive prefix of the revealed text.
pub type ProgressFn = Box<dyn FnMut(&str) + Send>;

/// Cooperative cancellation flag shared between a reveal loop and its caller.
///
/// Cancellation is not atomic with the pending timer: the flag is checked
/// before each scheduled callback, so at most one step delay elapses between
/// `cancel()` and the loop stopping.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a reveal pass: the last prefix that was delivered and whether
/// the whole target was replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub prefix: String,
    pub completed: bool,
}

/// Replay `target` as growing character prefixes.
///
/// Invokes `on_tick` once per character of `target`, each call preceded by a
/// `step` sleep and carrying a prefix exactly one character longer than the
/// previous call. Ticks are strictly sequential; the final tick's prefix
/// equals the whole target. Prefixes grow by `char`s, so multi-byte text is
/// never split mid code point.
///
/// Once `cancel` fires, no further ticks are delivered and the returned
/// prefix is the last one the callback saw; the caller is expected to commit
/// that prefix as the final text rather than discard it.
pub async fn reveal<F>(target: &str, step: Duration, cancel: &CancelToken, mut on_tick: F) -> Reveal
where
    F: FnMut(&str),
{
    let mut prefix = String::with_capacity(target.len());
    for ch in target.chars() {
        tokio::time::sleep(step).await;
        if cancel.is_cancelled() {
            return Reveal {
                prefix,
                completed: false,
            };
        }
        prefix.push(ch);
        on_tick(&prefix);
    }
    Reveal {
        prefix,
        completed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn ticks_once_per_character_in_order() {
        let mut seen = Vec::new();
        let out = reveal("abc", Duration::ZERO, &CancelToken::new(), |p| {
            seen.push(p.to_string());
        })
        .await;

        assert_eq!(seen, vec!["a", "ab", "abc"]);
        assert!(out.completed);
        assert_eq!(out.prefix, "abc");
    }

    #[tokio::test]
    async fn final_tick_equals_target_for_multibyte_text() {
        let target = "héllo ✓";
        let mut count = 0;
        let mut last = String::new();
        let out = reveal(target, Duration::ZERO, &CancelToken::new(), |p| {
            count += 1;
            last = p.to_string();
        })
        .await;

        assert_eq!(count, target.chars().count());
        assert_eq!(last, target);
        assert!(out.completed);
    }

    #[tokio::test]
    async fn empty_target_never_ticks() {
        let mut count = 0;
        let out = reveal("", Duration::ZERO, &CancelToken::new(), |_| count += 1).await;

        assert_eq!(count, 0);
        assert!(out.completed);
        assert_eq!(out.prefix, "");
    }

    #[tokio::test]
    async fn cancellation_keeps_the_last_delivered_prefix() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let mut seen = Vec::new();
        let out = reveal("abcdef", Duration::ZERO, &cancel, |p| {
            seen.push(p.to_string());
            if p.chars().count() == 3 {
                trigger.cancel();
            }
        })
        .await;

        assert!(!out.completed);
        assert_eq!(out.prefix, "abc");
        assert_eq!(seen.last().map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn cancellation_before_the_first_tick_yields_an_empty_prefix() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut count = 0;
        let out = reveal("abc", Duration::ZERO, &cancel, |_| count += 1).await;

        assert_eq!(count, 0);
        assert!(!out.completed);
        assert_eq!(out.prefix, "");
    }

    #[tokio::test]
    async fn each_tick_waits_at_least_the_step_delay() {
        let step = Duration::from_millis(2);
        let start = Instant::now();
        reveal("abcde", step, &CancelToken::new(), |_| {}).await;

        assert!(start.elapsed() >= step * 5);
    }
}
