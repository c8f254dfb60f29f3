/// Time utilities
pub mod time {
    use chrono::{DateTime, Duration, Utc};

    /// Short age label for a story header: "just now", "5m", "3h", "2d".
    pub fn relative_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let age = now.signed_duration_since(created_at);
        if age < Duration::minutes(1) {
            return "just now".to_string();
        }
        format_duration(age)
    }

    /// Format duration in human-readable form
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.num_seconds().max(0);

        if total_seconds < 60 {
            format!("{}s", total_seconds)
        } else if total_seconds < 3600 {
            format!("{}m", total_seconds / 60)
        } else if total_seconds < 86400 {
            format!("{}h", total_seconds / 3600)
        } else {
            format!("{}d", total_seconds / 86400)
        }
    }
}

/// Progress arithmetic shared by the timer and the UI.
pub mod progress {
    /// Percentage added by one tick under fixed-increment timing.
    pub fn step_per_tick(duration_ms: u64, tick_ms: u64) -> f64 {
        if duration_ms == 0 {
            return 0.0;
        }
        (100.0 * tick_ms as f64 / duration_ms as f64).min(100.0)
    }

    /// Ticks needed to run a story to completion.
    pub fn ticks_to_complete(duration_ms: u64, tick_ms: u64) -> u64 {
        if tick_ms == 0 {
            return 0;
        }
        duration_ms.div_ceil(tick_ms)
    }
}
