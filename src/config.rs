use std::time::Duration;

/// Tuning knobs for the sampling loops and probe reads.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How often the window watcher polls the foreground window.
    pub window_poll_interval: Duration,
    /// How often the pointer sampler records a position while running.
    pub pointer_sample_interval: Duration,
    /// Upper bound on a single probe read before it counts as failed.
    pub probe_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window_poll_interval: Duration::from_secs(1),
            pointer_sample_interval: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

impl TrackerConfig {
    /// Defaults, with `WORKTRACE_TICK_MS` overriding both loop intervals.
    /// Useful for watching the tracker behave without waiting on 1s ticks.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let tick_override = std::env::var("WORKTRACE_TICK_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|&ms| ms > 0);
        if let Some(ms) = tick_override {
            config.window_poll_interval = Duration::from_millis(ms);
            config.pointer_sample_interval = Duration::from_millis(ms);
        }
        config
    }
}
