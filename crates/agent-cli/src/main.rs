//! `tutor`: command-line front end for the tutoring assistant

mod commands;
mod trace;

use agent_tutor::{ProcessContext, RoutingPolicy, TutorConfig};
use agent_utils::ProcessEnv;
use agent_utils::auth::token_source_from_env;
use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(about = "Assistant scolaire multi-agents pour le collège", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Routing policy JSON file replacing the built-in one
    #[arg(long, global = true, value_name = "FILE")]
    pub routing_policy: Option<PathBuf>,

    /// Directory of `<name>.j2` templates overriding the built-in prompts
    #[arg(long, global = true, value_name = "DIR")]
    pub prompts_dir: Option<PathBuf>,

    /// JSON corpus searched in memory instead of Vertex AI Search
    #[arg(long, global = true, value_name = "FILE")]
    pub offline_corpus: Option<PathBuf>,

    /// Log agent activity at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the agent tree and check its structure
    Inspect,
    /// Classify a request with the routing policy, without calling a model
    Route {
        /// Student request
        query: String,
    },
    /// Answer one request
    Ask {
        /// Student request
        query: String,
        /// Session identifier
        #[arg(long, default_value = "cli")]
        session: String,
        /// Print the tool invocation trace after the answer
        #[arg(long)]
        trace: bool,
    },
    /// Interactive session; every question is answered on its own
    Chat {
        /// Session identifier attached to each request (no conversation memory)
        #[arg(long, default_value = "cli-chat")]
        session: String,
    },
}

impl GlobalArgs {
    /// Routing policy selected on the command line
    pub fn routing_policy(&self) -> anyhow::Result<RoutingPolicy> {
        match &self.routing_policy {
            Some(path) => RoutingPolicy::from_file(path)
                .with_context(|| format!("Cannot load routing policy {}", path.display())),
            None => Ok(RoutingPolicy::builtin()?),
        }
    }

    /// Process context from the environment and the command-line overrides
    pub async fn process_context(&self) -> anyhow::Result<ProcessContext> {
        let credentials = token_source_from_env(&ProcessEnv);
        let config = TutorConfig::from_env_with_credentials(&*credentials)
            .await
            .context("Invalid configuration")?;
        debug!(
            model = %config.model,
            project = ?config.project_id,
            developer_api = config.uses_developer_api(),
            credentials = credentials.name(),
            "Configuration loaded"
        );

        let mut builder = ProcessContext::builder(config).credentials(credentials);
        if let Some(path) = &self.routing_policy {
            builder = builder.routing_policy_file(path);
        }
        if let Some(dir) = &self.prompts_dir {
            builder = builder.prompts_dir(dir);
        }
        if let Some(corpus) = &self.offline_corpus {
            builder = builder.offline_corpus(corpus);
        }
        builder.build().context("Cannot initialize the assistant")
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    agent_utils::init_tracing_with_default(if cli.global.verbose {
        "info,agent_runtime=debug,agent_retrieval=debug,agent_tutor=debug"
    } else {
        "warn"
    });

    match cli.command {
        Command::Inspect => commands::inspect::execute(&cli.global).await,
        Command::Route { query } => commands::route::execute(&cli.global, &query),
        Command::Ask {
            query,
            session,
            trace,
        } => commands::ask::execute(&cli.global, &query, &session, trace).await,
        Command::Chat { session } => commands::chat::execute(&cli.global, &session).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tutor",
            "ask",
            "Qu'est-ce que la photosynthèse ?",
            "--offline-corpus",
            "corpus.json",
            "--trace",
        ])
        .unwrap();

        assert_eq!(cli.global.offline_corpus, Some(PathBuf::from("corpus.json")));
        assert!(matches!(
            cli.command,
            Command::Ask { ref session, trace: true, .. } if session == "cli"
        ));
    }

    #[test]
    fn test_route_requires_query() {
        assert!(Cli::try_parse_from(["tutor", "route"]).is_err());
    }

    #[test]
    fn test_builtin_policy_by_default() {
        let policy = GlobalArgs::default().routing_policy().unwrap();
        assert_eq!(policy.routes.len(), 4);
    }
}
