//! Application state and command handlers for the console.
//!
//! `App` owns the configuration, the session store and the API client, and
//! turns each subcommand into backend calls. A `SessionExpired` error from any
//! call is passed up unchanged so `main` can send the user back to login.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use animedash_core::models::{AnimeDraft, AnimeQuery, WebhookDraft, WebhookEvent};
use animedash_core::{ApiClient, ApiError, Config, HealthPoller, SessionStore, DEMO_TOKEN};

use crate::cli::{AnimeCommand, AnimeFields, Cli, LoginArgs, WebhookCommand};
use crate::ui::render;

/// Main application state container
pub struct App {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub api: ApiClient,
    json: bool,
}

impl App {
    /// Create a new application instance from the config file, environment
    /// and command line, in increasing order of precedence.
    pub fn new(cli: &Cli) -> Result<Self> {
        let mut config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        config.apply_env();
        if let Some(ref url) = cli.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(kind) = cli.credential_backend {
            config.credential_backend = kind;
        }
        debug!(
            api_url = %config.api_base_url,
            backend = %config.credential_backend,
            "Config loaded"
        );

        let session = Arc::new(config.open_session()?);
        let api = ApiClient::from_config(&config, Arc::clone(&session))
            .context("Failed to create API client")?;

        Ok(Self {
            config,
            session,
            api,
            json: cli.json,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, args: &LoginArgs) -> Result<()> {
        let (token, method) = if args.demo {
            (DEMO_TOKEN.to_string(), "demo")
        } else if let Some(ref id_token) = args.google {
            println!("Exchanging Google credential...");
            let token = self
                .api
                .exchange_google_token(id_token)
                .await
                .context("Google login failed")?;
            (token, "google")
        } else if let Some(ref token) = args.token {
            (token.trim().to_string(), "token")
        } else {
            (Self::prompt_token()?, "token")
        };

        if token.is_empty() {
            anyhow::bail!("No token given");
        }

        self.session
            .set_credential(&token)
            .context("Failed to store token")?;

        self.config.record_login(method);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        info!(method, "Login successful");
        if self.session.is_bypass_mode() {
            println!("Logged in (demo mode). Webhooks and health are served locally.");
        } else {
            println!("Logged in.");
        }
        Ok(())
    }

    fn prompt_token() -> Result<String> {
        let token = rpassword::prompt_password("Bearer token: ")?;
        Ok(token.trim().to_string())
    }

    pub async fn logout(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            println!("Not logged in.");
            return Ok(());
        }
        match self.api.logout().await {
            Ok(()) => println!("Logged out."),
            Err(e @ ApiError::CredentialNotRemoved(_)) => {
                return Err(anyhow::Error::new(e).context(format!(
                    "Remove the token from the {} store by hand",
                    self.session.backend_name()
                )));
            }
            Err(e) => println!("Logged out locally (server said: {}).", e),
        }
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        print!(
            "{}",
            render::status(
                self.session.state(),
                self.session.backend_name(),
                &self.config.api_base_url,
                self.config.last_login.as_ref(),
            )
        );
        Ok(())
    }

    pub async fn whoami(&self) -> Result<()> {
        self.require_login()?;
        let check = self.api.admin_check().await?;
        if self.json {
            return self.print_json(&check);
        }
        println!("Admin: {}", if check.is_admin { "yes" } else { "no" });
        if let Some(user) = check.user {
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Ok(())
    }

    /// Commands other than login/status need a stored credential.
    fn require_login(&self) -> Result<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::SessionExpired.into())
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn anime(&self, command: &AnimeCommand) -> Result<()> {
        self.require_login()?;
        match command {
            AnimeCommand::List { page, query, genre } => {
                let query = AnimeQuery {
                    q: query.clone(),
                    genre: genre.clone(),
                    ..AnimeQuery::page(*page)
                };
                let response = self.api.search_anime(&query).await?;
                if self.json {
                    return self.print_json(&response);
                }
                print!("{}", render::anime_page(&response, query.page));
            }
            AnimeCommand::Show { id } => {
                let response = self.api.get_anime(id).await?;
                if self.json {
                    return self.print_json(&response);
                }
                print!("{}", render::anime_detail(&response.data));
            }
            AnimeCommand::Create(fields) => {
                let title = flag(&fields.title)
                    .ok_or_else(|| anyhow::anyhow!("--title is required to create an entry"))?;
                let draft = Self::apply_fields(AnimeDraft::new(title), fields);
                let response = self.api.create_anime(&draft).await?;
                println!("Anime created successfully.");
                print!("{}", render::anime_detail(&response.data));
            }
            AnimeCommand::Update { id, fields } => {
                if Self::apply_fields(AnimeDraft::default(), fields).is_empty() {
                    anyhow::bail!("Nothing to update; give at least one field");
                }
                // Send the whole entry with the given fields replaced
                let current = self.api.get_anime(id).await?;
                let draft = Self::apply_fields(AnimeDraft::from(&current.data), fields);
                let response = self.api.update_anime(id, &draft).await?;
                println!("Anime updated successfully.");
                print!("{}", render::anime_detail(&response.data));
            }
            AnimeCommand::Delete { id, yes } => {
                if !*yes && !Self::confirm("Are you sure you want to delete this anime?")? {
                    println!("Cancelled.");
                    return Ok(());
                }
                self.api.delete_anime(id).await?;
                println!("Anime deleted successfully.");
            }
            AnimeCommand::Genres => {
                let genres = self.api.genres().await?;
                if self.json {
                    return self.print_json(&genres);
                }
                print!("{}", render::genres(&genres));
            }
        }
        Ok(())
    }

    /// Lay the given flags over `draft`. Blank flags are ignored.
    fn apply_fields(mut draft: AnimeDraft, fields: &AnimeFields) -> AnimeDraft {
        if let Some(title) = flag(&fields.title) {
            draft.title = Some(title.to_string());
        }
        if let Some(genre) = flag(&fields.genre) {
            draft = draft.genre(genre);
        }
        if let Some(description) = flag(&fields.description) {
            draft = draft.description(description);
        }
        if let Some(image_url) = flag(&fields.image_url) {
            draft = draft.image_url(image_url);
        }
        draft
    }

    // =========================================================================
    // Webhooks
    // =========================================================================

    pub async fn webhooks(&self, command: &WebhookCommand) -> Result<()> {
        self.require_login()?;
        match command {
            WebhookCommand::List => {
                let response = self.api.list_webhooks().await?;
                if self.json {
                    return self.print_json(&response);
                }
                print!("{}", render::webhooks(&response.data));
            }
            WebhookCommand::Add { url, events } => {
                let events = events
                    .iter()
                    .map(|e| e.parse::<WebhookEvent>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| anyhow::anyhow!(e))?;
                let response = self.api.create_webhook(&WebhookDraft::new(url, &events)).await?;
                let demo = self.session.is_bypass_mode();
                print!("{}", render::webhook_created(&response.data.id, &events, demo));
            }
            WebhookCommand::Remove { id, yes } => {
                if !*yes && !Self::confirm("Delete this webhook?")? {
                    println!("Cancelled.");
                    return Ok(());
                }
                self.api.delete_webhook(id).await?;
                print!("{}", render::webhook_removed(id, self.session.is_bypass_mode()));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Health & analytics
    // =========================================================================

    pub async fn health(&self, watch: bool) -> Result<()> {
        self.require_login()?;
        if !watch {
            let health = self.api.health().await?;
            if self.json {
                return self.print_json(&health);
            }
            print!("{}", render::health(&health));
            return Ok(());
        }

        let poller = HealthPoller::new(self.api.clone(), self.config.health_poll_interval());
        let (mut rx, handle) = poller.spawn();
        while rx.changed().await.is_ok() {
            let snapshot = match rx.borrow_and_update().clone() {
                Some(s) => s,
                None => continue,
            };
            if snapshot.session_expired {
                handle.abort();
                return Err(ApiError::SessionExpired.into());
            }
            println!("--- {} ---", snapshot.fetched_at.format("%H:%M:%S"));
            match snapshot.result {
                Ok(ref health) => print!("{}", render::health(health)),
                Err(ref e) => println!("Failed to load health status: {}", e),
            }
        }
        Ok(())
    }

    pub async fn analytics(&self) -> Result<()> {
        self.require_login()?;
        let data = self.api.analytics().await?;
        if self.json {
            return self.print_json(&data);
        }
        print!("{}", render::analytics(&data));
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn confirm(question: &str) -> Result<bool> {
        print!("{} [y/N]: ", question);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}

/// Trimmed value of an optional flag, `None` when blank.
fn flag(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use animedash_core::models::Anime;

    fn fields(title: Option<&str>, genre: Option<&str>) -> AnimeFields {
        AnimeFields {
            title: title.map(str::to_string),
            genre: genre.map(str::to_string),
            ..AnimeFields::default()
        }
    }

    #[test]
    fn test_apply_fields_trims_and_drops_blank_flags() {
        let given = AnimeFields {
            title: Some("  Monster ".to_string()),
            genre: Some("   ".to_string()),
            description: None,
            image_url: Some("https://img.example/m.png".to_string()),
        };
        let draft = App::apply_fields(AnimeDraft::default(), &given);
        assert_eq!(draft.title.as_deref(), Some("Monster"));
        assert_eq!(draft.genre, None);
        assert_eq!(draft.image_url.as_deref(), Some("https://img.example/m.png"));
    }

    #[test]
    fn test_apply_fields_with_no_flags_is_empty() {
        let draft = App::apply_fields(AnimeDraft::default(), &AnimeFields::default());
        assert!(draft.is_empty());
    }

    #[test]
    fn test_update_keeps_fields_not_given() {
        let current = Anime {
            id: "12".to_string(),
            title: "Monster".to_string(),
            slug: Some("monster".to_string()),
            genre: Some("Thriller".to_string()),
            description: Some("A surgeon hunts a killer".to_string()),
            image_url: Some("https://img.example/m.png".to_string()),
            links: None,
        };
        let draft = App::apply_fields(AnimeDraft::from(&current), &fields(None, Some("Mystery")));
        assert_eq!(draft.title.as_deref(), Some("Monster"));
        assert_eq!(draft.genre.as_deref(), Some("Mystery"));
        assert_eq!(draft.description.as_deref(), Some("A surgeon hunts a killer"));
        assert_eq!(draft.image_url.as_deref(), Some("https://img.example/m.png"));
    }

    #[test]
    fn test_flag_ignores_blank_values() {
        assert_eq!(flag(&Some(" x ".to_string())), Some("x"));
        assert_eq!(flag(&Some("  ".to_string())), None);
        assert_eq!(flag(&None), None);
    }
}
