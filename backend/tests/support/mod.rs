#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{Duration, NaiveDate};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to process-global env
/// vars so parallel tests do not interfere.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Hourly site CSV with `date,hour` columns, starting 2024-03-01 00:00.
///
/// Night hours (before 6 or after 18) get `GI = 0`; every tenth row has
/// `TM = 0`. When `spike` is set, the EAC of row `spike` is multiplied by 50.
pub fn site_csv(rows: usize, spike: Option<usize>) -> String {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut out = String::from("date,hour,GI,TM,EAC\n");
    for i in 0..rows {
        let ts = start + Duration::hours(i as i64);
        let hour = i % 24;
        let daylight = (6..=18).contains(&hour);
        let gi = if daylight {
            200.0 + 40.0 * (hour as f64 - 12.0).abs().mul_add(-1.0, 6.0)
        } else {
            0.0
        };
        let tm = if i % 10 == 0 { 0.0 } else { 15.0 + (i % 7) as f64 };
        let mut eac = gi * 0.01 + (i % 3) as f64 * 0.1;
        if spike == Some(i) {
            eac *= 50.0;
        }
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            ts.format("%Y-%m-%d"),
            hour,
            gi,
            tm,
            eac
        ));
    }
    out
}
