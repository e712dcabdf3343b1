use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Callback receiving (stage, current, total, message).
pub type ProgressCallback = dyn Fn(&str, u64, u64, &str) + Send + Sync;

const EMIT_INTERVAL: Duration = Duration::from_millis(200);

/// Rate limiter for the live progress line. A report goes through once the
/// previous one is at least EMIT_INTERVAL stale; the last item of a stage
/// always goes through so the line ends on the true totals.
pub struct ProgressLine<'a> {
    callback: &'a ProgressCallback,
    next_emit: Mutex<Instant>,
}

impl<'a> ProgressLine<'a> {
    pub fn new(callback: &'a ProgressCallback) -> Self {
        Self {
            callback,
            next_emit: Mutex::new(Instant::now()),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        if self.should_emit(current, total) {
            (self.callback)(stage, current, total, message);
        }
    }

    fn should_emit(&self, current: u64, total: u64) -> bool {
        let final_item = total == 0 || current >= total - 1;
        if final_item {
            return true;
        }
        let now = Instant::now();
        let mut next = self.next_emit.lock().unwrap();
        if now < *next {
            return false;
        }
        *next = now + EMIT_INTERVAL;
        true
    }
}

/// Thread-safe counters keyed by (component, outcome), feeding the one-block
/// summary printed at end of run.
#[derive(Debug, Default)]
pub struct Counters {
    counts: Mutex<BTreeMap<(&'static str, &'static str), u64>>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, component: &'static str, outcome: &'static str) {
        self.add_n(component, outcome, 1);
    }

    pub fn add_n(&self, component: &'static str, outcome: &'static str, n: u64) {
        if n == 0 {
            return;
        }
        *self
            .counts
            .lock()
            .unwrap()
            .entry((component, outcome))
            .or_insert(0) += n;
    }

    pub fn get(&self, component: &str, outcome: &str) -> u64 {
        self.counts
            .lock()
            .unwrap()
            .get(&(component, outcome))
            .copied()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<(&'static str, &'static str), u64> {
        self.counts.lock().unwrap().clone()
    }

    /// Render every non-zero counter as an aligned block.
    pub fn summary_table(&self) -> String {
        let counts = self.snapshot();
        let width = counts
            .keys()
            .map(|(c, o)| c.len() + o.len() + 1)
            .max()
            .unwrap_or(0);

        let mut out = String::from("=== Summary ===\n");
        for ((component, outcome), n) in &counts {
            if *n == 0 {
                continue;
            }
            let label = format!("{component}/{outcome}");
            out.push_str(&format!("  {label:<width$}  {n}\n"));
        }
        out.push_str("===============");
        out
    }
}
