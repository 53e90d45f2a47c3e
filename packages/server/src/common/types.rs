use std::time::Duration;

/// Render an interval the way admins read it ("2 hours", "90 minutes", "45 seconds").
pub fn humanize_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    let (value, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}
