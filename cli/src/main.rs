mod completion;
mod conf;
mod display;
mod error;
mod event;
mod payload;
mod prelude;

use crate::prelude::*;

#[derive(Parser)]
#[command(version, about = "GA4 Measurement Protocol CLI")]
struct Cli {
    /// Print machine readable JSON instead of the decorated output.
    #[arg(long, global = true, help = "Output JSON")]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand, about = "Build, validate and share events")]
    Event(event::EventCommand),
    #[command(subcommand, about = "Work with raw JSON payloads")]
    Payload(payload::PayloadCommand),
    #[command(about = "Show or update the CLI configuration")]
    Conf(conf::ConfCommand),
    #[command(about = "Generate shell completion scripts")]
    Completion(completion::CompletionCommand),
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Customize parsing error handling.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // These 2 are "not real errors" that are used to stop the execution
            // to display the CLI help or version.
            match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    println!("{e}");

                    std::process::exit(0);
                }
                _ => (),
            }

            eprintln!(
                "{ballot} {error}",
                ballot = "✘".red().bold(),
                error = MpCliError::SyntaxError(e)
            );

            std::process::exit(1);
        }
    };

    JSON_MODE.store(cli.json, Ordering::Relaxed);

    // Send each sub-command to the respective handler.
    let result = match cli.command {
        Command::Event(event) => event::handle(event).await,
        Command::Payload(payload) => payload::handle(payload).await,
        Command::Conf(conf) => conf::handle(conf).await,
        Command::Completion(completion) => completion::handle(completion),
    };

    // Handle any errors that occurred during command execution.
    if let Err(e) = result {
        eprintln!("{ballot} {e}", ballot = "✘".red().bold());

        std::process::exit(1);
    }
}
