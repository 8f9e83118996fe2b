use {
    crate::{prelude::*, Cli},
    clap::CommandFactory,
    std::io::Write,
};

/// Name the completion scripts are registered under.
const BIN_NAME: &str = "mp";

#[derive(Args)]
pub(crate) struct CompletionCommand {
    #[arg(value_enum)]
    pub(crate) shell: clap_complete::Shell,
}

pub(crate) fn handle(command: CompletionCommand) -> AnyResult<(), MpCliError> {
    write_completion(command.shell, &mut std::io::stdout());

    Ok(())
}

/// Render the completion script for `shell` into `out`.
fn write_completion(shell: clap_complete::Shell, out: &mut dyn Write) {
    let mut cli_command = Cli::command();

    clap_complete::generate(shell, &mut cli_command, BIN_NAME, out);
}
