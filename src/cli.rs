//! Command line: `geotag [serve]` or `geotag migrate <up|down|status>`.

use clap::{Parser, Subcommand};

/// Geo-Tagging Company API
#[derive(Parser, Debug)]
#[command(name = "geotag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Apply pending migrations, then serve the HTTP API
    Serve,

    /// Manage the database schema
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum MigrateAction {
    /// Apply every pending migration
    Up,

    /// Revert the most recently applied migrations
    Down {
        /// Number of migrations to revert
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },

    /// Show applied and pending migrations and unmanaged tables
    Status,
}

impl Cli {
    /// Serving is the default when no subcommand is given.
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["geotag"]).expect("parse");
        assert_eq!(cli.command(), &Command::Serve);
    }

    #[test]
    fn migrate_down_takes_steps() {
        let cli = Cli::try_parse_from(["geotag", "migrate", "down", "--steps", "2"]).expect("parse");
        assert_eq!(
            cli.command(),
            &Command::Migrate {
                action: MigrateAction::Down { steps: 2 }
            }
        );

        let cli = Cli::try_parse_from(["geotag", "migrate", "down"]).expect("parse");
        assert_eq!(
            cli.command(),
            &Command::Migrate {
                action: MigrateAction::Down { steps: 1 }
            }
        );
    }
}
