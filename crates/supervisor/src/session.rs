//! ShotSession - shot budget and rate limit for one tracking session

use std::time::Duration;

use contracts::FiringConfig;
use tokio::time::Instant;

/// Per-session firing bookkeeping
#[derive(Debug, Clone)]
pub struct ShotSession {
    shots_fired: u32,
    max_shots: u32,
    /// Instant the last shot was issued, successful or not
    last_fire_time: Option<Instant>,
    min_interval: Duration,
    dispensing: bool,
}

impl ShotSession {
    pub fn new(config: &FiringConfig) -> Self {
        Self {
            shots_fired: 0,
            max_shots: config.max_shots,
            last_fire_time: None,
            min_interval: config.min_interval(),
            dispensing: false,
        }
    }

    /// Budget left, no dispense in progress, interval elapsed
    pub fn can_fire(&self, now: Instant) -> bool {
        !self.dispensing && !self.is_exhausted() && self.interval_elapsed(now)
    }

    fn interval_elapsed(&self, now: Instant) -> bool {
        self.last_fire_time
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_interval)
    }

    /// Mark a shot as issued at `now`
    pub fn begin_dispense(&mut self, now: Instant) {
        self.dispensing = true;
        self.last_fire_time = Some(now);
    }

    /// Close the dispense; only a successful one is counted
    pub fn end_dispense(&mut self, success: bool) -> u32 {
        self.dispensing = false;
        if success {
            self.shots_fired += 1;
        }
        self.shots_fired
    }

    pub fn is_exhausted(&self) -> bool {
        self.shots_fired >= self.max_shots
    }

    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    pub fn max_shots(&self) -> u32 {
        self.max_shots
    }

    pub fn last_fire_time(&self) -> Option<Instant> {
        self.last_fire_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ShotSession {
        ShotSession::new(&FiringConfig::default())
    }

    #[test]
    fn test_first_shot_needs_no_interval() {
        let now = Instant::now();
        assert!(session().can_fire(now));
    }

    #[test]
    fn test_min_interval_from_issue_time() {
        let now = Instant::now();
        let mut session = session();
        session.begin_dispense(now);
        assert!(!session.can_fire(now), "dispense in progress");
        session.end_dispense(true);

        assert!(!session.can_fire(now + Duration::from_millis(1499)));
        assert!(session.can_fire(now + Duration::from_millis(1500)));
    }

    #[test]
    fn test_failed_dispense_not_counted_but_rate_limited() {
        let now = Instant::now();
        let mut session = session();
        session.begin_dispense(now);
        assert_eq!(session.end_dispense(false), 0);

        assert_eq!(session.last_fire_time(), Some(now));
        assert!(!session.can_fire(now + Duration::from_millis(100)));
    }

    #[test]
    fn test_budget_exhausted() {
        let mut now = Instant::now();
        let mut session = session();
        for _ in 0..4 {
            assert!(session.can_fire(now));
            session.begin_dispense(now);
            session.end_dispense(true);
            now += Duration::from_millis(1500);
        }
        assert!(session.is_exhausted());
        assert!(!session.can_fire(now));
        assert_eq!(session.shots_fired(), session.max_shots());
    }
}
