use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod runtime;
mod spec;
mod utils;

use cmd::{CheckArgs, HelpArgs, ListArgs, RunArgs, Session, ShellArgs};

/// cmdspec - declare command options in one line of text, validate
/// invocations against them and dispatch the ones that pass.
///
///   cmdspec run  "<LINE>"... [-f script] [--json]
///   cmdspec check [--json] COMMAND [ARGS/OPTIONS...]
///   cmdspec help [COMMAND] [OPTION]
///   cmdspec list [--json] [-a]
///   cmdspec shell [--prompt "% "]
///
/// Global flags / env:
///   -v / -vv          Increase verbosity (RUST_LOG overrides)
///   -q / --quiet      Errors only
///   -m / --manifest   YAML/JSON file declaring extra commands
///   --no-profile      Skip elapsed/cpu/memory reporting
///   CMDSPEC_MANIFEST  Environment fallback if -m not provided
///
/// Examples:
///   cmdspec run "echo -text hello -upper; sum 2 3 -scale 0.5"
///   cmdspec -m cells.yaml check place_cell u1 -orient Q
///   cmdspec help sum -scale
#[derive(Parser, Debug)]
#[command(
    name = "cmdspec",
    version,
    author,
    about = "cmdspec - command option specs, validation and dispatch",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Command manifest (YAML or JSON)
    #[arg(short = 'm', long = "manifest", global = true, value_name = "PATH")]
    manifest: Option<String>,

    /// Disable execution profiling
    #[arg(long = "no-profile", global = true)]
    no_profile: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute command lines
    Run(RunArgs),

    /// Validate one invocation without running it
    Check(CheckArgs),

    /// Show help for a command, an option, or all commands
    Help(HelpArgs),

    /// List registered commands
    List(ListArgs),

    /// Interactive dispatch loop on stdin
    Shell(ShellArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let session = Session::open(cli.manifest.as_deref(), cli.no_profile)?;

    match cli.command {
        Commands::Run(args) => cmd::execute_run(args, &session),
        Commands::Check(args) => cmd::execute_check(args, &session),
        Commands::Help(args) => cmd::execute_help(args, &session),
        Commands::List(args) => cmd::execute_list(args, &session),
        Commands::Shell(args) => cmd::execute_shell(args, &session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["cmdspec", "list", "-vv", "--no-profile", "-m", "x.yaml"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_profile);
        assert_eq!(cli.manifest.as_deref(), Some("x.yaml"));
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["cmdspec"]).is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
