//! Applicant identifiers and tracking tokens
//!
//! Applicant ids are derived from a microsecond clock forced to be strictly
//! increasing within the process, so ids issued by one process never repeat.
//! Tracking tokens carry only randomness; they are bearer capabilities for
//! read access and encode nothing about the applicant.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

pub const APPLICANT_ID_PREFIX: &str = "AIM-";
pub const TRACKING_TOKEN_PREFIX: &str = "track_";

/// Random characters in a tracking token (62^16 possibilities)
pub const TRACKING_TOKEN_RANDOM_LEN: usize = 16;

static LAST_TICK: AtomicU64 = AtomicU64::new(0);

/// Human-readable applicant id, e.g. `AIM-M3X9K2QF7A`
pub fn generate_applicant_id() -> String {
    format!("{}{}", APPLICANT_ID_PREFIX, to_base36(next_tick()))
}

/// Opaque tracking token, e.g. `track_q8ZfK2mT0aLw91Xc`
pub fn generate_tracking_token() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TRACKING_TOKEN_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", TRACKING_TOKEN_PREFIX, suffix)
}

/// Microseconds since the epoch, bumped past the last issued value
fn next_tick() -> u64 {
    let now = chrono::Utc::now().timestamp_micros().max(0) as u64;
    let mut last = LAST_TICK.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_TICK.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(observed) => last = observed,
        }
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
