//! Plain-text rendering of a [`PipelineResult`], one line per friend.

use earshot_core::view::{PipelineResult, ViewRecord};

/// Coarse relative time: minutes, hours, days, then weeks, each step rounded.
pub fn format_ago(seconds: i64) -> String {
  const STEPS: [(&str, i64); 4] = [("min", 60), ("hr", 60), ("d", 24), ("w", 7)];

  let mut value = seconds.max(0) as f64;
  for (i, &(unit, divisor)) in STEPS.iter().enumerate().take(STEPS.len() - 1) {
    value = (value / divisor as f64).round();
    if value < STEPS[i + 1].1 as f64 {
      return format!("{value} {unit}");
    }
  }
  let (unit, divisor) = STEPS[STEPS.len() - 1];
  format!("{} {unit}", (value / divisor as f64).round())
}

pub fn render_record(r: &ViewRecord) -> String {
  let status = if r.online { "Online".to_owned() } else { format_ago(r.seconds_ago) };
  let mut line = format!(
    "{} {:<24} {:>8}  {} · {}",
    if r.online { '●' } else { '○' },
    r.name,
    status,
    r.track,
    r.artist
  );
  if !r.context_name.is_empty() {
    line.push_str(&format!("  [{}]", r.context_name));
  }
  line
}

pub fn render(result: &PipelineResult) -> String {
  if result.is_loading() {
    return "Loading friend activity...".to_owned();
  }
  if let Some(error) = result.error() {
    return format!("error: {error}");
  }
  if result.entries().is_empty() {
    return "No friend activity.".to_owned();
  }
  result
    .entries()
    .iter()
    .map(render_record)
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(online: bool, seconds_ago: i64, context_name: &str) -> ViewRecord {
    ViewRecord {
      id:            "u1".into(),
      name:          "Ada".into(),
      track:         "Song".into(),
      artist:        "A, B".into(),
      seconds_ago,
      online,
      context_type:  "album".into(),
      context_name:  context_name.into(),
      context_url:   String::new(),
      track_url:     String::new(),
      artist_url:    String::new(),
      profile_image: None,
    }
  }

  #[test]
  fn relative_time_steps() {
    assert_eq!(format_ago(0), "0 min");
    assert_eq!(format_ago(89), "1 min");
    assert_eq!(format_ago(90), "2 min");
    assert_eq!(format_ago(59 * 60), "59 min");
    assert_eq!(format_ago(60 * 60), "1 hr");
    assert_eq!(format_ago(5 * 3600), "5 hr");
    assert_eq!(format_ago(3 * 86_400), "3 d");
    assert_eq!(format_ago(21 * 86_400), "3 w");
  }

  #[test]
  fn record_line_shows_status_and_context() {
    let online = render_record(&record(true, 10, "Record"));
    assert!(online.starts_with('●'));
    assert!(online.contains("Online"));
    assert!(online.contains("Song · A, B"));
    assert!(online.ends_with("[Record]"));

    let offline = render_record(&record(false, 7200, ""));
    assert!(offline.starts_with('○'));
    assert!(offline.contains("2 hr"));
    assert!(!offline.contains('['));
  }

  #[test]
  fn result_states() {
    assert_eq!(render(&PipelineResult::loading()), "Loading friend activity...");
    assert_eq!(render(&PipelineResult::failed("boom")), "error: boom");
    assert_eq!(render(&PipelineResult::ready(Vec::new())), "No friend activity.");
    let two = PipelineResult::ready(vec![record(true, 0, ""), record(false, 600, "")]);
    assert_eq!(render(&two).lines().count(), 2);
  }
}
