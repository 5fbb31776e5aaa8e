use chrono::{DateTime, Duration, Utc};

/// Fixed-window throttle for OTP resends, owned by whatever drives the
/// form. The session manager itself never enforces timing; callers arm
/// this after each successful send and check it before the next one.
#[derive(Debug, Clone)]
pub struct ResendCooldown {
    window: Duration,
    armed_at: Option<DateTime<Utc>>,
}

impl ResendCooldown {
    pub fn new(window_seconds: i64) -> Self {
        Self {
            window: Duration::seconds(window_seconds.max(0)),
            armed_at: None,
        }
    }

    pub fn arm(&mut self) {
        self.arm_at(Utc::now());
    }

    pub fn ready(&self) -> bool {
        self.ready_at(Utc::now())
    }

    /// Whole seconds until the window reopens; zero when ready.
    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_at(Utc::now())
    }

    pub fn arm_at(&mut self, now: DateTime<Utc>) {
        self.armed_at = Some(now);
    }

    pub fn ready_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_at(now) == 0
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> i64 {
        match self.armed_at {
            Some(armed_at) => {
                let reopen = armed_at + self.window;
                (reopen - now).num_seconds().max(0)
            }
            None => 0,
        }
    }
}
