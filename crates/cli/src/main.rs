use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tracing::Level;

use orchestra_planner::{Orchestrator, PlanOutcome};
use orchestra_server::{AppState, ServerConfig};

mod config;

use config::{AppConfig, PlannerKind, DEMO_QUERIES, DOCUMENT_QUERIES};

#[derive(Parser)]
#[command(name = "orchestra")]
#[command(about = "Plan and run agent skills against a chat model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use a local mock instead of Azure OpenAI
    #[arg(long, global = true)]
    mock: bool,

    /// How requests are turned into plans
    #[arg(long, global = true, value_enum, default_value = "rules")]
    planner: PlannerKind,

    /// Return the gathered source output without a synthesis step
    #[arg(long, global = true)]
    raw: bool,

    /// Per-call timeout for model-backed skills
    #[arg(long, global = true, env = "ORCHESTRA_SKILL_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question
    Ask {
        query: String,
        /// Print the full run as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the sample shopping and document questions
    Demo,
    /// List agents and their skills
    Agents,
    /// Serve the HTTP API
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let config = AppConfig {
        mock: cli.mock,
        planner: cli.planner,
        synthesize: !cli.raw,
        skill_timeout: cli.timeout_secs.map(Duration::from_secs),
    };
    let orchestrator = config.orchestrator()?;

    match cli.command {
        Commands::Ask { query, json } => {
            let outcome = orchestrator.handle(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }
        Commands::Demo => run_demo(&orchestrator).await?,
        Commands::Agents => {
            for agent in orchestrator.roster().summaries() {
                println!("{}: {}", agent.name, agent.description);
                for skill in agent.capabilities {
                    println!("  - {}", skill);
                }
            }
        }
        Commands::Serve { port } => {
            let server = ServerConfig::default().with_port(port);
            orchestra_server::serve(server, AppState::new(Arc::new(orchestrator))).await?;
        }
    }

    Ok(())
}

fn print_outcome(outcome: &PlanOutcome) {
    for step in &outcome.steps {
        println!(
            "[{}] {}.{} ({}ms)",
            step.step_id, step.agent, step.skill, step.duration_ms
        );
    }
    println!();
    println!("{}", outcome.response);
}

/// Questions run concurrently; results print in the original order
async fn run_demo(orchestrator: &Orchestrator) -> Result<()> {
    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("Data sources: product catalog, support knowledge base, reference documents");
    println!("{}", rule);

    let queries: Vec<&str> = DEMO_QUERIES.iter().chain(DOCUMENT_QUERIES.iter()).copied().collect();
    let outcomes = join_all(queries.iter().map(|q| orchestrator.handle(q))).await;

    for (query, outcome) in queries.iter().zip(outcomes) {
        println!();
        println!("{}", rule);
        println!("Query: {}", query);
        println!("{}", rule);
        print_outcome(&outcome?);
    }

    println!();
    println!("{}", rule);
    println!("Demo completed");
    println!("{}", rule);
    Ok(())
}
