//! Fixed-window request throttle backed by the shared store.
//!
//! One row per key; the window resets in place when it expires. Bursts of up
//! to 2x the limit are possible right at a window boundary; that tradeoff
//! buys one tiny row per key instead of a sliding log.

use chrono::Utc;
use quill_db::queries::rate_limits;
use rand::Rng;
use sqlx::PgPool;
use tracing::{debug, warn};

/// Floor for the retry hint so clients never hammer on a sub-second timer.
pub const MIN_RETRY_AFTER_MS: i64 = 1000;

/// rate_key column is VARCHAR(180).
pub const MAX_KEY_CHARS: usize = 180;

const SWEEP_PROBABILITY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub attempts: i32,
    pub remaining: i32,
    pub retry_after_ms: i64,
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    StartWindow,
    Increment,
    Deny { retry_after_ms: i64 },
}

/// Pure window math over the row read from the store: `window` is
/// `(window_start_ms, attempts)` or None when no row exists.
fn decide(now_ms: i64, window: Option<(i64, i32)>, window_ms: i64, max_attempts: i32) -> Action {
    match window {
        None => Action::StartWindow,
        Some((start_ms, _)) if now_ms - start_ms >= window_ms => Action::StartWindow,
        Some((_, attempts)) if attempts < max_attempts => Action::Increment,
        Some((start_ms, _)) => Action::Deny {
            retry_after_ms: (window_ms - (now_ms - start_ms)).max(MIN_RETRY_AFTER_MS),
        },
    }
}

/// Compose a rate key from its parts. Caller convention is
/// `action:site:client-ip[:resource]`; the result is capped to the column
/// width so adversarially long inputs cannot fail the write.
pub fn compose_key(parts: &[&str]) -> String {
    let key = parts.join(":");
    if key.chars().count() > MAX_KEY_CHARS {
        key.chars().take(MAX_KEY_CHARS).collect()
    } else {
        key
    }
}

pub async fn consume(
    pool: &PgPool,
    key: &str,
    window_ms: i64,
    max_attempts: i32,
) -> Result<RateLimitDecision, sqlx::Error> {
    let key = compose_key(&[key]);
    let now_ms = Utc::now().timestamp_millis();

    maybe_sweep(pool);

    let window = rate_limits::get(pool, &key).await?;
    let state = window.as_ref().map(|w| (w.window_start_ms, w.attempts));

    match decide(now_ms, state, window_ms, max_attempts) {
        Action::StartWindow => {
            rate_limits::start_window(pool, &key, now_ms).await?;
            Ok(RateLimitDecision {
                allowed: true,
                attempts: 1,
                remaining: (max_attempts - 1).max(0),
                retry_after_ms: 0,
            })
        }
        Action::Increment => {
            match rate_limits::increment(pool, &key).await? {
                Some(attempts) if attempts <= max_attempts => Ok(RateLimitDecision {
                    allowed: true,
                    attempts,
                    remaining: (max_attempts - attempts).max(0),
                    retry_after_ms: 0,
                }),
                // Concurrent writers pushed the counter past the limit
                // between our read and this increment.
                Some(attempts) => {
                    let start_ms = state.map(|(s, _)| s).unwrap_or(now_ms);
                    Ok(RateLimitDecision {
                        allowed: false,
                        attempts,
                        remaining: 0,
                        retry_after_ms: (window_ms - (now_ms - start_ms)).max(MIN_RETRY_AFTER_MS),
                    })
                }
                // Row vanished under us (concurrent clear or sweep).
                None => {
                    rate_limits::start_window(pool, &key, now_ms).await?;
                    Ok(RateLimitDecision {
                        allowed: true,
                        attempts: 1,
                        remaining: (max_attempts - 1).max(0),
                        retry_after_ms: 0,
                    })
                }
            }
        }
        Action::Deny { retry_after_ms } => Ok(RateLimitDecision {
            allowed: false,
            attempts: state.map(|(_, a)| a).unwrap_or(max_attempts),
            remaining: 0,
            retry_after_ms,
        }),
    }
}

/// Drop a window immediately instead of waiting for expiry, e.g. to reset
/// login attempts after a successful authentication.
pub async fn clear(pool: &PgPool, key: &str) -> Result<(), sqlx::Error> {
    let key = compose_key(&[key]);
    rate_limits::clear(pool, &key).await
}

/// ~1% of consume calls kick off a detached sweep of rows stale by more than
/// 24 hours. The caller's response never waits on it.
fn maybe_sweep(pool: &PgPool) {
    if rand::thread_rng().gen::<f64>() >= SWEEP_PROBABILITY {
        return;
    }
    let pool = pool.clone();
    tokio::spawn(async move {
        match rate_limits::delete_stale(&pool).await {
            Ok(0) => {}
            Ok(deleted) => debug!(deleted, "swept stale rate-limit windows"),
            Err(err) => warn!(error = %err, "rate-limit sweep failed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW_MS: i64 = 1000;
    const MAX: i32 = 3;

    #[test]
    fn test_no_row_starts_window() {
        assert_eq!(decide(5_000, None, WINDOW_MS, MAX), Action::StartWindow);
    }

    #[test]
    fn test_attempts_within_limit_increment() {
        assert_eq!(
            decide(5_000, Some((4_500, 1)), WINDOW_MS, MAX),
            Action::Increment
        );
        assert_eq!(
            decide(5_000, Some((4_500, 2)), WINDOW_MS, MAX),
            Action::Increment
        );
    }

    #[test]
    fn test_exhausted_window_denies_with_retry_hint() {
        let action = decide(5_000, Some((4_500, 3)), WINDOW_MS, MAX);
        assert_eq!(
            action,
            Action::Deny {
                retry_after_ms: MIN_RETRY_AFTER_MS
            }
        );

        // Wider window: the hint is the actual remaining time.
        let action = decide(5_000, Some((2_000, 3)), 10_000, MAX);
        assert_eq!(
            action,
            Action::Deny {
                retry_after_ms: 7_000
            }
        );
    }

    #[test]
    fn test_retry_hint_never_below_floor() {
        let action = decide(5_999, Some((5_000, 3)), WINDOW_MS, MAX);
        assert_eq!(
            action,
            Action::Deny {
                retry_after_ms: MIN_RETRY_AFTER_MS
            }
        );
    }

    #[test]
    fn test_expired_window_resets() {
        assert_eq!(
            decide(6_000, Some((5_000, 3)), WINDOW_MS, MAX),
            Action::StartWindow
        );
        assert_eq!(
            decide(60_000, Some((5_000, 1)), WINDOW_MS, MAX),
            Action::StartWindow
        );
    }

    #[test]
    fn test_three_consume_then_deny_sequence() {
        // Walks the decision table the way consume() drives it: exactly
        // max_attempts allowed inside one window, then denial.
        let start = 10_000;
        assert_eq!(decide(start, None, WINDOW_MS, MAX), Action::StartWindow);
        assert_eq!(
            decide(start + 100, Some((start, 1)), WINDOW_MS, MAX),
            Action::Increment
        );
        assert_eq!(
            decide(start + 200, Some((start, 2)), WINDOW_MS, MAX),
            Action::Increment
        );
        assert!(matches!(
            decide(start + 300, Some((start, 3)), WINDOW_MS, MAX),
            Action::Deny { retry_after_ms } if retry_after_ms > 0
        ));
        assert_eq!(
            decide(start + WINDOW_MS, Some((start, 3)), WINDOW_MS, MAX),
            Action::StartWindow
        );
    }

    #[test]
    fn test_compose_key_caps_length() {
        let key = compose_key(&["comment", "42", &"x".repeat(400)]);
        assert_eq!(key.chars().count(), MAX_KEY_CHARS);

        let short = compose_key(&["comment", "42", "203.0.113.7"]);
        assert_eq!(short, "comment:42:203.0.113.7");
    }
}
