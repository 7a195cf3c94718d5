//! Command line definition.

use std::path::PathBuf;

use animedash_core::config::CredentialBackendKind;
use clap::{Args, Parser, Subcommand};

/// Admin console for the anime catalog backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "ANIMEDASH_API_URL")]
    pub api_url: Option<String>,

    /// Where the login token is kept: file, keyring or memory
    #[arg(long, global = true, env = "ANIMEDASH_CREDENTIAL_BACKEND")]
    pub credential_backend: Option<CredentialBackendKind>,

    /// Write logs to daily files in this directory instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with a bearer token, a Google ID token, or in demo mode
    Login(LoginArgs),
    /// Log out and forget the stored token
    Logout,
    /// Show whether the console is logged in
    Status,
    /// Ask the backend whether the current user is an admin
    Whoami,
    /// Manage catalog entries
    #[command(subcommand)]
    Anime(AnimeCommand),
    /// Manage webhook registrations
    #[command(subcommand)]
    Webhooks(WebhookCommand),
    /// Show backend health
    Health {
        /// Keep refreshing on the configured interval
        #[arg(long)]
        watch: bool,
    },
    /// Show request analytics
    Analytics,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct LoginArgs {
    /// Bearer token to use as is
    #[arg(long)]
    pub token: Option<String>,

    /// Google ID token to exchange for a backend token
    #[arg(long)]
    pub google: Option<String>,

    /// Log in locally without a backend token
    #[arg(long)]
    pub demo: bool,
}

#[derive(Subcommand, Debug)]
pub enum AnimeCommand {
    /// Search the catalog
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Search text
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long, short)]
        genre: Option<String>,
    },
    /// Show one entry
    Show { id: String },
    /// Create an entry
    Create(AnimeFields),
    /// Update an entry; only the given fields change
    Update {
        id: String,
        #[command(flatten)]
        fields: AnimeFields,
    },
    /// Delete an entry
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Show genres and how many entries each has
    Genres,
}

#[derive(Args, Debug, Default)]
pub struct AnimeFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum WebhookCommand {
    /// List registered webhooks
    List,
    /// Register a webhook
    Add {
        #[arg(long)]
        url: String,
        /// Event to subscribe to (anime.created, anime.updated, anime.deleted); repeatable
        #[arg(long = "event", short, required = true)]
        events: Vec<String>,
    },
    /// Remove a webhook
    Remove {
        id: String,
        #[arg(long, short)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_anime_update() {
        let cli = Cli::try_parse_from([
            "animedash",
            "anime",
            "update",
            "12",
            "--title",
            "Monster",
            "--image-url",
            "https://img.example/m.png",
        ])
        .unwrap();
        match cli.command {
            Command::Anime(AnimeCommand::Update { id, fields }) => {
                assert_eq!(id, "12");
                assert_eq!(fields.title.as_deref(), Some("Monster"));
                assert_eq!(fields.image_url.as_deref(), Some("https://img.example/m.png"));
                assert!(fields.genre.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_login_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["animedash", "login", "--demo", "--token", "abc"]).is_err());
        assert!(Cli::try_parse_from(["animedash", "login", "--demo"]).is_ok());
    }

    #[test]
    fn test_webhook_add_requires_event() {
        let missing = ["animedash", "webhooks", "add", "--url", "https://x.example"];
        assert!(Cli::try_parse_from(missing).is_err());
        let cli = Cli::try_parse_from([
            "animedash",
            "webhooks",
            "add",
            "--url",
            "https://x.example",
            "-e",
            "anime.created",
            "-e",
            "anime.deleted",
        ])
        .unwrap();
        match cli.command {
            Command::Webhooks(WebhookCommand::Add { events, .. }) => assert_eq!(events.len(), 2),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
