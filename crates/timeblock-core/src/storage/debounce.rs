//! Write coalescing.
//!
//! Mutations only bump a per-document generation. A periodic poller calls
//! [`WriteScheduler::due`] with the current instant; a document becomes due
//! once it has been quiet for its window, or has stayed dirty for its
//! max-wait even while changing every tick.

use std::time::{Duration, Instant};

use super::Document;

#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    max_wait: Duration,
    generation: u64,
    seen_generation: u64,
    first_dirty: Option<Instant>,
    last_change: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration, max_wait: Duration) -> Self {
        Self {
            window,
            max_wait: max_wait.max(window),
            generation: 0,
            seen_generation: 0,
            first_dirty: None,
            last_change: None,
        }
    }

    pub fn mark(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_dirty(&self) -> bool {
        self.generation != self.seen_generation || self.first_dirty.is_some()
    }

    fn observe(&mut self, now: Instant) {
        if self.generation != self.seen_generation {
            self.seen_generation = self.generation;
            self.last_change = Some(now);
            self.first_dirty.get_or_insert(now);
        }
    }

    /// Observe pending marks at `now` and report whether a flush is due.
    pub fn is_due(&mut self, now: Instant) -> bool {
        self.observe(now);
        match (self.first_dirty, self.last_change) {
            (Some(first), Some(last)) => {
                now.saturating_duration_since(last) >= self.window
                    || now.saturating_duration_since(first) >= self.max_wait
            }
            _ => false,
        }
    }

    /// Forget pending marks after a flush.
    pub fn clear(&mut self) {
        self.seen_generation = self.generation;
        self.first_dirty = None;
        self.last_change = None;
    }

    pub fn set_windows(&mut self, window: Duration, max_wait: Duration) {
        self.window = window;
        self.max_wait = max_wait.max(window);
    }
}

/// One [`Debounce`] per document. Block and run-state writes share the short
/// window; stats use the longer one.
#[derive(Debug, Clone)]
pub struct WriteScheduler {
    blocks: Debounce,
    run_state: Debounce,
    stats: Debounce,
}

impl WriteScheduler {
    pub fn new(state_window: Duration, state_max_wait: Duration, stats_window: Duration, stats_max_wait: Duration) -> Self {
        Self {
            blocks: Debounce::new(state_window, state_max_wait),
            run_state: Debounce::new(state_window, state_max_wait),
            stats: Debounce::new(stats_window, stats_max_wait),
        }
    }

    fn slot(&mut self, document: Document) -> &mut Debounce {
        match document {
            Document::Blocks => &mut self.blocks,
            Document::RunState => &mut self.run_state,
            Document::Stats => &mut self.stats,
        }
    }

    pub fn mark(&mut self, document: Document) {
        self.slot(document).mark();
    }

    pub fn is_dirty(&self, document: Document) -> bool {
        match document {
            Document::Blocks => self.blocks.is_dirty(),
            Document::RunState => self.run_state.is_dirty(),
            Document::Stats => self.stats.is_dirty(),
        }
    }

    /// Documents due at `now`. They are cleared; re-[`mark`](Self::mark)
    /// one if its write fails.
    pub fn due(&mut self, now: Instant) -> Vec<Document> {
        Document::ALL
            .into_iter()
            .filter(|doc| {
                let slot = self.slot(*doc);
                let due = slot.is_due(now);
                if due {
                    slot.clear();
                }
                due
            })
            .collect()
    }

    /// Every dirty document regardless of timing, cleared.
    pub fn take_dirty(&mut self) -> Vec<Document> {
        Document::ALL
            .into_iter()
            .filter(|doc| {
                let dirty = self.is_dirty(*doc);
                if dirty {
                    self.slot(*doc).clear();
                }
                dirty
            })
            .collect()
    }

    pub fn set_windows(&mut self, state_window: Duration, state_max_wait: Duration, stats_window: Duration, stats_max_wait: Duration) {
        self.blocks.set_windows(state_window, state_max_wait);
        self.run_state.set_windows(state_window, state_max_wait);
        self.stats.set_windows(stats_window, stats_max_wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn flushes_after_quiet_window() {
        let start = Instant::now();
        let mut d = Debounce::new(secs(1), secs(5));
        assert!(!d.is_due(start));
        d.mark();
        assert!(!d.is_due(start));
        assert!(!d.is_due(start + Duration::from_millis(900)));
        assert!(d.is_due(start + secs(1)));
    }

    #[test]
    fn continuous_changes_flush_at_max_wait() {
        let start = Instant::now();
        let mut d = Debounce::new(secs(1), secs(5));
        for i in 0..5 {
            d.mark();
            assert!(!d.is_due(start + Duration::from_millis(i * 900)), "tick {i}");
        }
        d.mark();
        assert!(d.is_due(start + secs(5)));
    }

    #[test]
    fn scheduler_separates_documents() {
        let start = Instant::now();
        let mut s = WriteScheduler::new(secs(1), secs(5), secs(5), secs(60));
        s.mark(Document::Blocks);
        s.mark(Document::Stats);
        assert!(s.due(start).is_empty());
        assert_eq!(s.due(start + secs(1)), vec![Document::Blocks]);
        assert!(!s.is_dirty(Document::Blocks));
        assert_eq!(s.due(start + secs(5)), vec![Document::Stats]);
        assert!(s.due(start + secs(60)).is_empty());
    }

    #[test]
    fn take_dirty_ignores_timing() {
        let mut s = WriteScheduler::new(secs(1), secs(5), secs(5), secs(60));
        s.mark(Document::RunState);
        assert_eq!(s.take_dirty(), vec![Document::RunState]);
        assert!(s.take_dirty().is_empty());
    }
}
