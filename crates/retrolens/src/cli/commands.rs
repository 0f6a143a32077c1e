use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use colored::*;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use crate::cli::display::{display_feedback, display_retro, display_theme, display_trend_point, format_score};
use crate::config::Config;
use crate::embedding::OpenAiEmbeddingProvider;
use crate::export::{self, RetroExport};
use crate::feedback::{FeedbackItem, FeedbackType, Retrospective};
use crate::sentiment::{sentiment_score, sentiment_trend, FeedbackSummary};
use crate::server::{startup::start_server, AppState};
use crate::store::{FeedbackSource, FileStore, RetroStore};
use crate::themes::{ThemeRequest, ThemeService, ThemesError};

fn open_store(config: &Config) -> FileStore {
  FileStore::new(config.store_path())
}

/// Run the REST server in the foreground
pub async fn serve(config: &Config, bind: Option<SocketAddr>) -> Result<()> {
  let state = AppState::from_config(config)?;
  start_server(bind.unwrap_or(config.bind), state).await
}

pub async fn create_retro(
  config: &Config,
  team: &str,
  sprint_name: Option<&str>,
  sprint_number: Option<u32>,
) -> Result<()> {
  if team.trim().is_empty() {
    return Err(anyhow!("Team name is required"));
  }

  let store = open_store(config);
  let retro = Retrospective::new(sprint_name.unwrap_or_default().to_string(), sprint_number, team.to_string());
  let retro = store.create_retro(retro).await?;

  println!("{} Created retrospective {} for {}", "✓".green(), retro.sprint_title().cyan(), retro.team_name.yellow());
  println!("  id: {}", retro.id);
  Ok(())
}

pub async fn list_retros(config: &Config) -> Result<()> {
  let retros = open_store(config).list_retros().await?;

  if retros.is_empty() {
    println!("No retrospectives found.");
    return Ok(());
  }

  for retro in &retros {
    display_retro(retro);
  }
  Ok(())
}

pub async fn add_feedback(
  config: &Config,
  retro_id: &str,
  feedback_type: FeedbackType,
  message: &str,
  email: Option<&str>,
) -> Result<()> {
  if message.trim().is_empty() {
    return Err(anyhow!("Feedback message is required"));
  }

  let item = FeedbackItem::new(retro_id, feedback_type, message.trim()).with_optional_author(email);

  let item = open_store(config).add_feedback(item).await?;
  println!("{} Added {} feedback {}", "✓".green(), item.feedback_type, item.id.dimmed());
  Ok(())
}

pub async fn list_feedback(config: &Config, retro_id: &str) -> Result<()> {
  let store = open_store(config);
  let retro = store.get_retro(retro_id).await?;
  let feedback = store.feedback_for(retro_id, None).await?;

  display_retro(&retro);
  if feedback.is_empty() {
    println!("  No feedback yet.");
  }
  for item in &feedback {
    display_feedback(item);
  }
  Ok(())
}

/// Identify and save themes for a retrospective
pub async fn identify_themes(
  config: &Config,
  retro_id: &str,
  feedback_type: Option<FeedbackType>,
  clusters: Option<usize>,
) -> Result<()> {
  let store = Arc::new(open_store(config));
  let provider = Arc::new(OpenAiEmbeddingProvider::new(config.embedding()?)?);
  let service = ThemeService::new(provider, store.clone(), store);

  let request = ThemeRequest { retro_id: retro_id.to_string(), feedback_type, num_clusters: clusters };
  let report = match service.identify_themes(&request).await {
    Ok(report) => report,
    Err(ThemesError::NoFeedback) => {
      println!("{} {}", "!".yellow(), ThemesError::NoFeedback);
      return Ok(());
    }
    Err(e) => return Err(e.into()),
  };

  println!("{} {}", "✓".green(), report.message);
  for theme in &report.themes {
    display_theme(theme);
  }
  Ok(())
}

pub async fn sentiment(config: &Config, retro_id: &str) -> Result<()> {
  let store = open_store(config);
  let retro = store.get_retro(retro_id).await?;
  let summary = FeedbackSummary::from_items(&store.feedback_for(retro_id, None).await?);

  display_retro(&retro);
  println!("  Sentiment: {}", format_score(sentiment_score(&summary)));
  println!(
    "  {} well, {} didn't, {} blockers, {} suggestions ({} total)",
    summary.well_count, summary.didnt_count, summary.blocker_count, summary.suggestion_count, summary.total_count
  );
  Ok(())
}

/// Sentiment over the most recent retrospectives, oldest first
pub async fn sentiment_trends(config: &Config, team: Option<&str>, limit: usize) -> Result<()> {
  let points = sentiment_trend(&open_store(config), team, limit).await?;

  if points.is_empty() {
    println!("No retrospectives found.");
    return Ok(());
  }

  println!("{} Sentiment over {} retrospectives", "📈".cyan(), points.len());
  for point in &points {
    display_trend_point(point);
  }

  let average = points.iter().map(|p| p.score).sum::<f64>() / points.len() as f64;
  println!("  Average: {}", format_score(average));
  Ok(())
}

/// Print the markdown export, or write it to `output`
pub async fn export_markdown(config: &Config, retro_id: &str, output: Option<&Path>) -> Result<()> {
  let store = open_store(config);
  let data = RetroExport::load(&store, retro_id).await?;
  let markdown = export::to_markdown(&data, Utc::now().date_naive());

  match output {
    Some(path) => {
      tokio::fs::write(path, markdown).await.with_context(|| format!("Failed to write {}", path.display()))?;
      println!("{} Exported {} to {}", "✓".green(), data.retro.sprint_title().cyan(), path.display());
    }
    None => print!("{markdown}"),
  }
  Ok(())
}
