use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lambda_runtime::{service_fn, LambdaEvent};
use sql_run::invoke::read_event;
use sql_run::{logging, schema, state};
use sql_run_configuration::RuntimeSettings;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    settings: RuntimeSettings,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve lifecycle events as a Lambda function. The default.
    Serve,
    /// Handle a single event and print the response.
    Invoke {
        /// Read the event from this file instead of stdin.
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Print the JSON Schema of the resource properties.
    Schema,
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let Cli { settings, command } = Cli::parse();
    let result = match command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Invoke { event } => invoke(settings, event).await,
        Command::Schema => schema::write_schema(std::io::stdout().lock()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(settings: RuntimeSettings) -> anyhow::Result<()> {
    logging::init_logging(settings.log_format)?;
    let handler = state::create_handler(settings).await;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
        let handler = handler.clone();
        async move {
            handler
                .handle_json(event.payload)
                .await
                .map_err(lambda_runtime::Error::from)
        }
    }))
    .await
    .map_err(|err| anyhow::anyhow!("lambda runtime stopped: {err}"))
}

async fn invoke(settings: RuntimeSettings, event: Option<PathBuf>) -> anyhow::Result<()> {
    logging::init_logging(settings.log_format)?;
    let input = read_event(event.as_deref(), tokio::io::stdin()).await?;

    let handler = state::create_handler(settings).await;
    let output = handler.handle_bytes(&input).await?;
    println!("{}", String::from_utf8_lossy(&output));
    Ok(())
}
