use anyhow::Result;
use clap::{Parser, Subcommand};
use retrolens::cli::{commands, init_tracing};
use retrolens::config::Config;
use retrolens::feedback::FeedbackType;
use retrolens::sentiment::DEFAULT_TREND_LIMIT;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "retrolens")]
#[command(about = "Retrolens - Team retrospective feedback with theme identification")]
#[command(version)]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run the REST API server
  Serve {
    /// Server bind address (defaults to RETROLENS_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,
  },
  /// Create a retrospective
  NewRetro {
    /// Team running the retrospective
    #[arg(long)]
    team: String,
    /// Sprint name
    #[arg(long)]
    sprint_name: Option<String>,
    /// Sprint number, used as the title when no name is given
    #[arg(long)]
    sprint_number: Option<u32>,
  },
  /// List retrospectives
  Retros,
  /// Add a feedback item to a retrospective
  Add {
    retro_id: String,
    /// well, didnt, blocker, or suggestion
    feedback_type: FeedbackType,
    message: String,
    /// Attribute the item to this email instead of posting anonymously
    #[arg(long)]
    email: Option<String>,
  },
  /// Show the feedback for a retrospective
  Feedback { retro_id: String },
  /// Cluster feedback into themes and save them
  Themes {
    retro_id: String,
    /// Only cluster feedback of this type
    #[arg(short = 't', long = "type")]
    feedback_type: Option<FeedbackType>,
    /// Requested number of themes
    #[arg(short = 'k', long)]
    clusters: Option<usize>,
  },
  /// Show the sentiment score for a retrospective
  Sentiment { retro_id: String },
  /// Show sentiment across recent retrospectives
  Trends {
    /// Only include this team's retrospectives
    #[arg(long)]
    team: Option<String>,
    /// Number of most recent retrospectives to include
    #[arg(short, long, default_value_t = DEFAULT_TREND_LIMIT)]
    limit: usize,
  },
  /// Export a retrospective as markdown
  Export {
    retro_id: String,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

async fn handle(command: Command, config: &Config) -> Result<()> {
  match command {
    Command::Serve { bind } => commands::serve(config, bind).await,
    Command::NewRetro { team, sprint_name, sprint_number } => {
      commands::create_retro(config, &team, sprint_name.as_deref(), sprint_number).await
    }
    Command::Retros => commands::list_retros(config).await,
    Command::Add { retro_id, feedback_type, message, email } => {
      commands::add_feedback(config, &retro_id, feedback_type, &message, email.as_deref()).await
    }
    Command::Feedback { retro_id } => commands::list_feedback(config, &retro_id).await,
    Command::Themes { retro_id, feedback_type, clusters } => {
      commands::identify_themes(config, &retro_id, feedback_type, clusters).await
    }
    Command::Sentiment { retro_id } => commands::sentiment(config, &retro_id).await,
    Command::Trends { team, limit } => commands::sentiment_trends(config, team.as_deref(), limit).await,
    Command::Export { retro_id, output } => commands::export_markdown(config, &retro_id, output.as_deref()).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let config = Config::from_env()?;
  handle(cli.command, &config).await
}
