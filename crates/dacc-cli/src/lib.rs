pub mod cli;

pub use cli::{build_cli_command, ArtifactArg, Cli, Commands, ConfigCommands, NameCommands};
