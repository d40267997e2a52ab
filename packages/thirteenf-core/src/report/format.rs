//! Number, date and length formatting shared by the renderers.

use chrono::{Datelike, NaiveDate};

/// Maximum characters in one published message.
pub const MAX_MESSAGE_LEN: usize = 280;

/// Format a date like `Sep 30th, 2025`.
pub fn format_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}, {}", date.format("%b"), day, suffix, date.year())
}

/// Calendar quarter label like `Q3 2025`.
pub fn quarter_label(date: NaiveDate) -> String {
    format!("Q{} {}", date.month0() / 3 + 1, date.year())
}

/// Dollar amount in billions, e.g. `$1.23B`.
pub fn billions(value: u64) -> String {
    format!("${:.2}B", value as f64 / 1_000_000_000.0)
}

/// Signed percentage points, e.g. `+1.2pp` / `-0.4pp`.
pub fn signed_pp(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{delta:.1}pp")
    } else {
        format!("{delta:.1}pp")
    }
}

/// Signed weight delta in percent, e.g. `+1.2%` / `-0.4%` / `0.0%`.
pub fn signed_weight(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{delta:.1}%")
    } else {
        format!("{delta:.1}%")
    }
}

/// Signed percent where zero counts as a gain, e.g. `+0.0%`.
pub fn signed_pct(pct: f64) -> String {
    if pct >= 0.0 {
        format!("+{pct:.1}%")
    } else {
        format!("{pct:.1}%")
    }
}

/// Clip `text` to at most `max` characters, dropping whole trailing lines.
///
/// A first line that alone exceeds the limit is cut mid-line.
pub fn fit_message(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    let mut first = true;
    for line in text.lines() {
        let sep = usize::from(!first);
        let len = line.chars().count();
        if used + sep + len > max {
            break;
        }
        if !first {
            out.push('\n');
        }
        out.push_str(line);
        used += sep + len;
        first = false;
    }

    if out.trim().is_empty() {
        return text.chars().take(max).collect();
    }
    out.trim_end().to_string()
}
