use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use safespace::advice::AdviceGenerator;
use safespace::config::Config;
use safespace::ensemble::predict_threat;
use safespace::models::{download, ModelRegistry};
use safespace::rules::{categorize, resolve_level, ThreatLevel};
use safespace::web::{run_server, AppState};

#[derive(Parser)]
#[command(name = "safespace", about = "ML-assisted threat detection for local news", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
    /// Analyze a single text from the command line
    Analyze {
        /// Text to analyze
        text: String,
        /// City for location-specific advice
        #[arg(long)]
        city: Option<String>,
    },
    /// Download model artifacts
    DownloadModels {
        /// Base URL to fetch artifacts from (or SAFESPACE_MODEL_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Show model availability
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("safespace=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Serve { port, bind } => {
            let registry = {
                let dir = config.model_dir.clone();
                tokio::task::spawn_blocking(move || ModelRegistry::load_all(&dir)).await?
            };
            let state = AppState::new(config, registry);
            run_server(state, &bind, port).await?;
        }

        Command::Analyze { text, city } => {
            let registry = ModelRegistry::load_all(&config.model_dir);
            analyze_text(&registry, config.advice_generator(), &text, city.as_deref()).await;
        }

        Command::DownloadModels { base_url } => {
            let base_url = base_url
                .or_else(|| std::env::var("SAFESPACE_MODEL_BASE_URL").ok())
                .ok_or_else(|| {
                    anyhow::anyhow!("No artifact URL: pass --base-url or set SAFESPACE_MODEL_BASE_URL")
                })?;
            println!("Downloading models to {}", config.model_dir.display());
            download::download_models(&base_url, &config.model_dir).await?;
            println!("{}", "Done.".green());
        }

        Command::Status => {
            let registry = ModelRegistry::load_all(&config.model_dir);
            print_status(&registry);
        }
    }

    Ok(())
}

async fn analyze_text(
    registry: &ModelRegistry,
    advice: AdviceGenerator,
    text: &str,
    city: Option<&str>,
) {
    let assessment = predict_threat(registry, text);
    let (category, rule_level) = categorize(text, "");
    let level = resolve_level(&assessment, rule_level);

    let verdict = if assessment.is_threat {
        "THREAT".red().bold()
    } else {
        "no threat".green()
    };

    println!("\n  {}", text.bold());
    println!("  Verdict:    {verdict}");
    println!("  Confidence: {:.2}", assessment.final_confidence);
    println!("  Category:   {category}");
    println!("  Level:      {}", colorize_level(level));
    println!("  Models:     {}", assessment.models_used.join(", "));

    let generated = advice.generate(category, level, city, text, "").await;
    if !generated.items.is_empty() {
        let source = if generated.ai_generated { "AI" } else { "static" };
        println!("  Advice ({source}):");
        for item in &generated.items {
            println!("    - {item}");
        }
    }
}

fn print_status(registry: &ModelRegistry) {
    println!("\n  Model directory: {}", registry.model_dir().display());
    for kind in safespace::models::ModelKind::ALL {
        let state = registry.state(kind);
        let shown = if state.is_loaded() {
            "loaded".green()
        } else {
            format!("{state:?}").to_lowercase().as_str().normal()
        };
        println!("  {:10} {}", kind.as_str(), shown);
    }
    println!(
        "  {} of 3 models available{}",
        registry.loaded_count(),
        if registry.any_loaded() { "" } else { " (keyword fallbacks active)" }
    );
}

fn colorize_level(level: ThreatLevel) -> colored::ColoredString {
    match level {
        ThreatLevel::High => level.as_str().red().bold(),
        ThreatLevel::Medium => level.as_str().yellow(),
        ThreatLevel::Low => level.as_str().green(),
    }
}
