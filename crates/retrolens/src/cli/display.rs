//! Display formatting utilities for CLI output

use colored::*;

use crate::feedback::{FeedbackItem, FeedbackType, Retrospective};
use crate::sentiment::SentimentPoint;
use crate::themes::ThemeSummary;

pub fn feedback_type_label(feedback_type: FeedbackType) -> ColoredString {
  match feedback_type {
    FeedbackType::Well => "well".green(),
    FeedbackType::Didnt => "didnt".red(),
    FeedbackType::Blocker => "blocker".yellow(),
    FeedbackType::Suggestion => "suggestion".blue(),
  }
}

pub fn display_retro(retro: &Retrospective) {
  println!(
    "{} {} {} {}",
    "📋".cyan(),
    retro.sprint_title().bold(),
    format!("({})", retro.team_name).dimmed(),
    retro.id.yellow()
  );
}

pub fn display_feedback(item: &FeedbackItem) {
  println!("  [{}] {}", feedback_type_label(item.feedback_type), item.message);
}

pub fn display_theme(theme: &ThemeSummary) {
  let count = match theme.feedback_count {
    1 => "1 item".to_string(),
    n => format!("{n} items"),
  };
  println!("{} {} {}", "🔍".cyan(), theme.name.bold(), format!("[{}, {count}]", theme.theme_type).dimmed());
}

pub fn display_trend_point(point: &SentimentPoint) {
  println!(
    "  {}  {:<24} {:<16} {} {}",
    point.created_at.format("%Y-%m-%d"),
    point.sprint_title,
    point.team_name,
    format_score(point.score),
    format!("({} items)", point.summary.total_count).dimmed()
  );
}

/// Colour a sentiment score by sign
pub fn format_score(score: f64) -> ColoredString {
  let text = format!("{score:+.2}");
  if score > 0.0 {
    text.green()
  } else if score < 0.0 {
    text.red()
  } else {
    text.normal()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_score_keeps_sign_and_precision() {
    colored::control::set_override(false);

    assert_eq!(format_score(0.4567).to_string(), "+0.46");
    assert_eq!(format_score(-1.0).to_string(), "-1.00");
    assert_eq!(format_score(0.0).to_string(), "+0.00");
  }

  #[test]
  fn test_feedback_type_label_text() {
    colored::control::set_override(false);

    for feedback_type in FeedbackType::ALL {
      assert_eq!(feedback_type_label(feedback_type).to_string(), feedback_type.as_str());
    }
  }
}
