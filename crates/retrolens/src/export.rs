//! Markdown summary of a retrospective

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::feedback::{FeedbackItem, FeedbackType, ReactionCount, ReactionType, Retrospective};
use crate::store::{RetroStore, StoreError};
use crate::themes::Theme;

/// Everything that goes into an exported document
#[derive(Debug, Clone)]
pub struct RetroExport {
  pub retro: Retrospective,
  pub feedback: Vec<FeedbackItem>,
  pub reactions: HashMap<String, ReactionCount>,
  pub themes: Vec<Theme>,
}

impl RetroExport {
  pub async fn load(store: &dyn RetroStore, retro_id: &str) -> Result<Self, StoreError> {
    let retro = store.get_retro(retro_id).await?;
    let feedback = store.feedback_for(retro_id, None).await?;
    let themes = store.themes_for(retro_id).await?;

    let mut reactions = HashMap::new();
    for item in &feedback {
      let counts = store.reactions_for(&item.id).await?;
      if !counts.is_empty() {
        reactions.insert(item.id.clone(), counts);
      }
    }

    Ok(Self { retro, feedback, reactions, themes })
  }

  fn items_of(&self, feedback_type: FeedbackType) -> impl Iterator<Item = &FeedbackItem> {
    self.feedback.iter().filter(move |item| item.feedback_type == feedback_type)
  }
}

fn section_heading(feedback_type: FeedbackType) -> &'static str {
  match feedback_type {
    FeedbackType::Well => "## ✅ What Went Well",
    FeedbackType::Didnt => "## ❌ What Didn't Go Well",
    FeedbackType::Blocker => "## ⚠️ Blockers",
    FeedbackType::Suggestion => "## 💡 Suggestions",
  }
}

fn empty_section(feedback_type: FeedbackType) -> &'static str {
  match feedback_type {
    FeedbackType::Well | FeedbackType::Didnt => "*No feedback provided*",
    FeedbackType::Blocker => "*No blockers reported*",
    FeedbackType::Suggestion => "*No suggestions provided*",
  }
}

/// Render the export; `exported_on` is stamped into the header
pub fn to_markdown(export: &RetroExport, exported_on: NaiveDate) -> String {
  let mut markdown = format!("# {} Retrospective\n\n", export.retro.sprint_title());
  markdown.push_str(&format!("**Team:** {}\n", export.retro.team_name));
  markdown.push_str(&format!("**Date:** {}\n", export.retro.created_at.format("%Y-%m-%d")));
  markdown.push_str(&format!("**Exported:** {}\n\n", exported_on.format("%Y-%m-%d")));

  for feedback_type in FeedbackType::ALL {
    markdown.push_str(section_heading(feedback_type));
    markdown.push_str("\n\n");

    let mut items = export.items_of(feedback_type).peekable();
    if items.peek().is_none() {
      markdown.push_str(empty_section(feedback_type));
      markdown.push_str("\n\n");
      continue;
    }

    for item in items {
      markdown.push_str(&item_line(item, export.reactions.get(&item.id)));
    }
    markdown.push('\n');
  }

  if !export.themes.is_empty() {
    markdown.push_str("## 🔍 Identified Themes\n\n");
    for theme in &export.themes {
      markdown.push_str(&format!(
        "### {}\n*Type: {}, {} items*\n\n",
        theme.name,
        theme.theme_type,
        theme.feedback_ids.len()
      ));
    }
  }

  markdown.push_str("## 🎯 Action Items\n\n1. \n2. \n3. \n\n");
  markdown
}

fn item_line(item: &FeedbackItem, reactions: Option<&ReactionCount>) -> String {
  let mut line = format!("- {}", item.message);

  if let Some(counts) = reactions.filter(|counts| !counts.is_empty()) {
    let mut parts = Vec::new();
    if counts.thumbsup > 0 {
      parts.push(format!("{} {}", ReactionType::Thumbsup.emoji(), counts.thumbsup));
    }
    if counts.thumbsdown > 0 {
      parts.push(format!("{} {}", ReactionType::Thumbsdown.emoji(), counts.thumbsdown));
    }
    line.push_str(&format!(" [{}]", parts.join(" | ")));
  }

  if let Some(email) = item.user_email.as_deref().filter(|_| !item.anonymous) {
    line.push_str(&format!(" *({email})*"));
  }

  line.push('\n');
  line
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  fn retro() -> Retrospective {
    let mut retro = Retrospective::new(String::new(), Some(12), "Payments".to_string());
    retro.created_at = Utc.with_ymd_and_hms(2024, 5, 6, 9, 30, 0).unwrap();
    retro
  }

  fn exported_on() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 8).unwrap()
  }

  #[test]
  fn test_empty_retro_has_placeholder_sections() {
    let export = RetroExport { retro: retro(), feedback: Vec::new(), reactions: HashMap::new(), themes: Vec::new() };

    let markdown = to_markdown(&export, exported_on());

    let expected = "# Sprint 12 Retrospective\n\n\
      **Team:** Payments\n\
      **Date:** 2024-05-06\n\
      **Exported:** 2024-05-08\n\n\
      ## ✅ What Went Well\n\n*No feedback provided*\n\n\
      ## ❌ What Didn't Go Well\n\n*No feedback provided*\n\n\
      ## ⚠️ Blockers\n\n*No blockers reported*\n\n\
      ## 💡 Suggestions\n\n*No suggestions provided*\n\n\
      ## 🎯 Action Items\n\n1. \n2. \n3. \n\n";
    assert_eq!(markdown, expected);
  }

  #[test]
  fn test_items_show_reactions_and_named_authors() {
    let retro = retro();
    let praised = FeedbackItem::new(&retro.id, FeedbackType::Well, "Pairing on the migration");
    let disputed = FeedbackItem::new(&retro.id, FeedbackType::Well, "Shorter standups").with_author("dana@example.com");
    let quiet = FeedbackItem::new(&retro.id, FeedbackType::Blocker, "Staging was down");

    let mut reactions = HashMap::new();
    reactions.insert(praised.id.clone(), ReactionCount { thumbsup: 3, thumbsdown: 0 });
    reactions.insert(disputed.id.clone(), ReactionCount { thumbsup: 1, thumbsdown: 2 });

    let export = RetroExport { retro, feedback: vec![praised, disputed, quiet], reactions, themes: Vec::new() };
    let markdown = to_markdown(&export, exported_on());

    assert!(markdown.contains("- Pairing on the migration [👍 3]\n"));
    assert!(markdown.contains("- Shorter standups [👍 1 | 👎 2] *(dana@example.com)*\n"));
    assert!(markdown.contains("## ⚠️ Blockers\n\n- Staging was down\n\n"));
    assert!(!markdown.contains("Identified Themes"));
  }

  #[test]
  fn test_anonymous_items_hide_email() {
    let retro = retro();
    let mut item = FeedbackItem::new(&retro.id, FeedbackType::Suggestion, "Rotate facilitators");
    item.user_email = Some("lee@example.com".to_string());

    let export = RetroExport { retro, feedback: vec![item], reactions: HashMap::new(), themes: Vec::new() };
    let markdown = to_markdown(&export, exported_on());

    assert!(markdown.contains("- Rotate facilitators\n"));
    assert!(!markdown.contains("lee@example.com"));
  }

  #[test]
  fn test_themes_section_lists_each_theme() {
    let retro = retro();
    let theme = Theme {
      name: "Flaky tests".to_string(),
      retro_id: retro.id.clone(),
      feedback_ids: vec!["a".to_string(), "b".to_string()],
      theme_type: "all".to_string(),
      embedding: None,
    };

    let export = RetroExport { retro, feedback: Vec::new(), reactions: HashMap::new(), themes: vec![theme] };
    let markdown = to_markdown(&export, exported_on());

    assert!(markdown.contains("## 🔍 Identified Themes\n\n### Flaky tests\n*Type: all, 2 items*\n\n## 🎯 Action Items"));
  }
}
