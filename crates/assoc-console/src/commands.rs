//! Subcommand implementations.
//!
//! Each command returns the text to print so it can be checked in tests;
//! only `watch` writes directly to stdout.

use anyhow::{anyhow, bail, Result};
use tracing::info;

use assoc_core::{Action, Resource};
use assoc_notify::is_visible;

use crate::app::Console;
use crate::output::{format_entry, format_matrix, format_profile};

const NOT_LOGGED_IN: &str =
    "not logged in: run `assoc-console login <token>` or set ASSOC_TOKEN";

fn require_token(console: &Console) -> Result<()> {
    if console.api.has_token() {
        Ok(())
    } else {
        bail!(NOT_LOGGED_IN)
    }
}

/// Profile and capability matrix of the current user.
pub async fn whoami(console: &Console) -> Result<String> {
    require_token(console)?;
    console.resolver.refresh(console.api.as_ref()).await;

    let profile = console
        .resolver
        .profile()
        .ok_or_else(|| anyhow!("profile unavailable, see logs for details"))?;
    Ok(format!(
        "{}\n\n{}",
        format_profile(&profile, console.resolver.can_validate_users()),
        format_matrix(&console.resolver.matrix())
    ))
}

/// Whether the current user may perform `action` on `resource`.
pub async fn can(console: &Console, action: Action, resource: Resource) -> (bool, String) {
    console.resolver.refresh(console.api.as_ref()).await;
    let allowed = console.resolver.can(action, resource);
    let verdict = if allowed { "allowed" } else { "denied" };
    (allowed, format!("{} {}: {}", action, resource, verdict))
}

/// Cached notification list, optionally scoped to the viewer's role.
pub async fn list(console: &Console, scoped: bool, unread_only: bool) -> Result<String> {
    require_token(console)?;
    let mut entries = console.reconciler.get_notifications().await;
    if scoped {
        let viewer = console.viewer().await;
        entries = console.reconciler.visible_notifications(&viewer);
    }
    if unread_only {
        entries.retain(|e| !e.read);
    }

    if entries.is_empty() {
        return Ok("No notifications".to_string());
    }
    Ok(entries
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn unread(console: &Console) -> Result<String> {
    require_token(console)?;
    console.reconciler.get_notifications().await;
    Ok(console.reconciler.get_unread_count().await.to_string())
}

pub async fn mark_read(console: &Console, id: i64) -> Result<String> {
    require_token(console)?;
    console.reconciler.get_notifications().await;
    if !console.reconciler.mark_as_read(id).await {
        bail!("failed to mark notification #{} as read", id);
    }
    Ok(format!("Marked #{} as read", id))
}

pub async fn mark_all_read(console: &Console) -> Result<String> {
    require_token(console)?;
    console.reconciler.get_notifications().await;
    if !console.reconciler.mark_all_as_read().await {
        bail!("failed to mark all notifications as read");
    }
    Ok("Marked all notifications as read".to_string())
}

/// Click handling: acknowledge, then navigate.
pub async fn open(console: &Console, id: i64) -> Result<String> {
    require_token(console)?;
    let entry = console
        .reconciler
        .get_notifications()
        .await
        .into_iter()
        .find(|e| e.id == id)
        .ok_or_else(|| anyhow!("notification #{} not found", id))?;

    match console.reconciler.handle_notification_click(&entry).await {
        Some(route) => Ok(format!("Opened #{} at {}", id, route)),
        None => Ok(format!("Opened #{} (no route)", id)),
    }
}

pub fn login(console: &Console, token: &str) -> Result<String> {
    if token.trim().is_empty() {
        bail!("token must not be empty");
    }
    console.tokens.store(token)?;
    Ok("Token stored".to_string())
}

pub fn logout(console: &Console) -> Result<String> {
    console.tokens.clear()?;
    console.resolver.clear();
    Ok("Token cleared".to_string())
}

/// Poll until Ctrl-C, printing every newly observed entry.
pub async fn watch(console: &Console, scoped: bool) -> Result<()> {
    require_token(console)?;
    let viewer = if scoped {
        Some(console.viewer().await)
    } else {
        None
    };

    let _subscription = console.reconciler.subscribe(move |entries| {
        for entry in entries {
            if viewer.as_ref().map_or(true, |v| is_visible(entry, v)) {
                println!("{}", format_entry(entry));
            }
        }
        Ok(())
    });

    if !console.reconciler.initialize() {
        bail!(NOT_LOGGED_IN);
    }
    info!(
        poll_interval_secs = console.reconciler.config().poll_interval_secs,
        "Watching notifications, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    console.reconciler.cleanup();
    Ok(())
}
