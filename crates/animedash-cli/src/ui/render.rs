use std::fmt::Write;

use animedash_core::config::LastLogin;
use animedash_core::models::{
    AnalyticsData, Anime, ApiResponse, GenreCounts, HealthStatus, Webhook, WebhookEvent,
};
use animedash_core::SessionState;

use crate::utils::{format_date, format_optional, truncate_string};

/// Column widths for the catalog table
const ID_WIDTH: usize = 6;
const TITLE_WIDTH: usize = 36;
const GENRE_WIDTH: usize = 14;
const URL_WIDTH: usize = 44;

/// Shown after a webhook change in demo mode
const DEMO_NOT_SAVED: &str =
    "Demo mode: webhook changes last only for this command and are not saved.";

/// Number of recent requests shown on the analytics screen
const RECENT_REQUESTS_SHOWN: usize = 10;

pub fn anime_page(response: &ApiResponse<Vec<Anime>>, page: u32) -> String {
    let mut out = String::new();
    if response.data.is_empty() {
        out.push_str("No anime found.\n");
    } else {
        let _ = writeln!(
            out,
            "{:<ID_WIDTH$} {:<TITLE_WIDTH$} {:<GENRE_WIDTH$} SLUG",
            "ID", "TITLE", "GENRE"
        );
        for anime in &response.data {
            let _ = writeln!(
                out,
                "{:<ID_WIDTH$} {:<TITLE_WIDTH$} {:<GENRE_WIDTH$} {}",
                truncate_string(&anime.id, ID_WIDTH),
                truncate_string(&anime.title, TITLE_WIDTH),
                truncate_string(anime.genre_display(), GENRE_WIDTH),
                format_optional(anime.slug.as_deref(), "-"),
            );
        }
    }

    if let Some(ref meta) = response.meta {
        let last_page = meta.last_page.unwrap_or(1);
        let _ = write!(out, "\nPage {} of {}", page, last_page);
        if let Some(total) = meta.total {
            let _ = write!(out, " ({} total)", total);
        }
        if meta.cached {
            out.push_str(" [cached]");
        }
        out.push('\n');
        if meta.has_prev(page) {
            let _ = writeln!(out, "Previous: --page {}", page - 1);
        }
        if meta.has_next(page) {
            let _ = writeln!(out, "Next: --page {}", page + 1);
        }
    }
    out
}

pub fn anime_detail(anime: &Anime) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", anime.title, anime.id);
    let _ = writeln!(out, "  Slug:        {}", format_optional(anime.slug.as_deref(), "-"));
    let _ = writeln!(out, "  Genre:       {}", anime.genre_display());
    let _ = writeln!(out, "  Image URL:   {}", format_optional(anime.image_url.as_deref(), "-"));
    if let Some(ref links) = anime.links {
        let _ = writeln!(out, "  Link:        {}", links.self_link);
    }
    let _ = writeln!(out, "  Description: {}", format_optional(anime.description.as_deref(), "-"));
    out
}

pub fn genres(genres: &GenreCounts) -> String {
    if genres.is_empty() {
        return "No genres.\n".to_string();
    }
    let width = genres.keys().map(|g| g.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (genre, count) in genres {
        let _ = writeln!(out, "{:<width$}  {}", genre, count);
    }
    out
}

pub fn webhooks(webhooks: &[Webhook]) -> String {
    if webhooks.is_empty() {
        return "No webhooks registered.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<ID_WIDTH$} {:<URL_WIDTH$} {:<9} {:<14} EVENTS",
        "ID", "URL", "STATUS", "CREATED"
    );
    for hook in webhooks {
        let _ = writeln!(
            out,
            "{:<ID_WIDTH$} {:<URL_WIDTH$} {:<9} {:<14} {}",
            truncate_string(&hook.id, ID_WIDTH),
            truncate_string(&hook.url, URL_WIDTH),
            hook.status_display(),
            format_date(&hook.created_at),
            hook.events.join(", "),
        );
    }
    out
}

pub fn webhook_created(id: &str, events: &[WebhookEvent], demo: bool) -> String {
    let labels: Vec<&str> = events.iter().map(WebhookEvent::label).collect();
    let mut out = format!("Webhook {} created for: {}.\n", id, labels.join(", "));
    if demo {
        let _ = writeln!(out, "{}", DEMO_NOT_SAVED);
    }
    out
}

pub fn webhook_removed(id: &str, demo: bool) -> String {
    let mut out = format!("Webhook {} deleted.\n", id);
    if demo {
        let _ = writeln!(out, "{}", DEMO_NOT_SAVED);
    }
    out
}

pub fn health(health: &HealthStatus) -> String {
    let mut out = String::new();
    let overall = if health.is_healthy() { "healthy" } else { "degraded" };
    let _ = writeln!(out, "Status: {} ({})", health.status, overall);
    for (name, value) in health.checks.iter() {
        let marker = if value == "ok" { "ok " } else { "!! " };
        let _ = writeln!(out, "  {} {:<10} {}", marker, name, value);
    }
    let _ = writeln!(
        out,
        "Memory: {} used, {} peak",
        health.memory_usage.used, health.memory_usage.peak
    );
    let _ = writeln!(out, "Uptime: {}", health.uptime);
    let _ = writeln!(out, "Server time: {}", format_date(&health.server_time));
    out
}

pub fn analytics(data: &AnalyticsData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total requests:    {}", data.total_requests);
    let _ = writeln!(out, "Avg response time: {:.0} ms", data.average_response_time);
    let _ = writeln!(out, "Error rate:        {:.1}%", data.error_rate() * 100.0);

    out.push_str("\nBy method:\n");
    for (method, count) in &data.methods {
        let _ = writeln!(out, "  {:<8} {}", method, count);
    }
    out.push_str("\nBy status:\n");
    for (status, count) in &data.status_codes {
        let _ = writeln!(out, "  {:<8} {}", status, count);
    }
    if !data.daily_requests.is_empty() {
        out.push_str("\nDaily:\n");
        for (day, count) in &data.daily_requests {
            let _ = writeln!(out, "  {:<12} {}", day, count);
        }
    }
    if !data.recent_requests.is_empty() {
        out.push_str("\nRecent requests:\n");
        for req in data.recent_requests.iter().take(RECENT_REQUESTS_SHOWN) {
            let _ = writeln!(
                out,
                "  {} {:<6} {:<28} {} {:>5.0}ms {}",
                req.timestamp,
                req.method,
                truncate_string(&req.endpoint, 28),
                req.status,
                req.duration,
                req.ip.as_deref().unwrap_or("-"),
            );
        }
    }
    out
}

pub fn status(
    state: SessionState,
    backend: &str,
    api_url: &str,
    last_login: Option<&LastLogin>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Session: {}", state);
    let _ = writeln!(out, "Backend: {}", api_url);
    let _ = writeln!(out, "Token storage: {}", backend);
    if let Some(login) = last_login {
        let _ = writeln!(
            out,
            "Last login: {} via {}",
            login.at.format("%b %d, %Y %H:%M"),
            login.method
        );
    }
    out
}
