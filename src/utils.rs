use crate::prelude::*;

/// Relative time in the "3 hours ago" form.
pub fn diff_for_humans(date: DateTime, now: DateTime) -> String {
  let delta = now - date;
  let (delta, suffix) = if delta < TimeDelta::zero() {
    (-delta, "from now")
  } else {
    (delta, "ago")
  };

  let seconds = delta.num_seconds();
  let (value, unit) = match seconds {
    s if s < 60 => (s.max(1), "second"),
    s if s < 3600 => (s / 60, "minute"),
    s if s < 86_400 => (s / 3600, "hour"),
    s if s < 7 * 86_400 => (s / 86_400, "day"),
    s if s < 30 * 86_400 => (s / (7 * 86_400), "week"),
    s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
    s => (s / (365 * 86_400), "year"),
  };

  let plural = if value == 1 { "" } else { "s" };
  format!("{value} {unit}{plural} {suffix}")
}

pub fn escape_html(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  for ch in input.chars() {
    match ch {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#039;"),
      _ => out.push(ch),
    }
  }
  out
}
