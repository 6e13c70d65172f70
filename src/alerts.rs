use std::collections::HashMap;

pub trait Clock {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Suppresses a message that was already shown within `window_ms`.
pub struct AlertThrottle<C: Clock> {
    clock: C,
    window_ms: i64,
    recent: HashMap<String, i64>,
}

impl<C: Clock> AlertThrottle<C> {
    pub fn new(clock: C, window_ms: i64) -> Self {
        Self {
            clock,
            window_ms,
            recent: HashMap::new(),
        }
    }

    pub fn should_show(&mut self, message: &str) -> bool {
        let now = self.clock.now_millis();
        let window = self.window_ms;
        self.recent.retain(|_, shown_at| now - *shown_at < window);
        if self.recent.contains_key(message) {
            return false;
        }
        self.recent.insert(message.to_string(), now);
        true
    }

    /// Print each message to stderr unless it was just shown. Returns how
    /// many were printed.
    pub fn report(&mut self, messages: &[String]) -> usize {
        let mut shown = 0;
        for msg in messages {
            if self.should_show(msg) {
                eprintln!("  - {msg}");
                shown += 1;
            }
        }
        shown
    }
}
