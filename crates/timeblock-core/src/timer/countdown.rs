//! Countdown source bookkeeping.
//!
//! The authoritative remaining time is the per-second counter held by the
//! engine; this type only tracks whether the periodic source is live and the
//! wall-clock deadline shown to the user.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    running: bool,
    deadline: Option<DateTime<Utc>>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Arm the source. Fails if one is already live.
    pub fn start(&mut self, remaining_seconds: u64, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        if self.running {
            return Err(CoreError::TimerAlreadyRunning);
        }
        let secs = i64::try_from(remaining_seconds).unwrap_or(i64::MAX);
        let deadline = Duration::try_seconds(secs)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.running = true;
        self.deadline = Some(deadline);
        Ok(deadline)
    }

    /// Tear the source down. Idempotent.
    pub fn stop(&mut self) {
        self.running = false;
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_start_is_rejected() {
        let mut c = Countdown::new();
        let now = Utc::now();
        let deadline = c.start(90, now).unwrap();
        assert_eq!(deadline, now + Duration::seconds(90));
        assert!(matches!(c.start(10, now), Err(CoreError::TimerAlreadyRunning)));
        assert_eq!(c.deadline(), Some(deadline));
    }

    #[test]
    fn stop_then_start_again() {
        let mut c = Countdown::new();
        let now = Utc::now();
        c.start(5, now).unwrap();
        c.stop();
        assert!(!c.is_running());
        assert!(c.deadline().is_none());
        assert!(c.start(5, now).is_ok());
    }
}
