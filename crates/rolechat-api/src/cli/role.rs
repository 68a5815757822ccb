//! Role CLI commands: list, create, sync, history.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use rolechat_types::message::MessageRole;
use rolechat_types::role::{CreateRoleRequest, Role, RoleId};

use rolechat_api::state::AppState;

/// Print all roles as a table, newest first.
pub async fn list_roles(state: &AppState, json: bool) -> Result<()> {
    let roles = state.role_service.list_roles().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&roles)?);
        return Ok(());
    }

    if roles.is_empty() {
        println!();
        println!(
            "  No roles yet. Create one with {}",
            style("rolechat roles create --name <NAME>").cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Agent").fg(Color::White),
        Cell::new("Persona").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for role in &roles {
        let agent_cell = match &role.agent_id {
            Some(agent_id) => Cell::new(agent_id).fg(Color::Green),
            None => Cell::new("unbound").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&role.name),
            Cell::new(role.id.to_string()).fg(Color::DarkGrey),
            agent_cell,
            Cell::new(truncate(&role.persona, 40)),
            Cell::new(role.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    println!("{table}");
    println!("  {} role(s)", roles.len());
    Ok(())
}

/// Create a role and its upstream agent.
pub async fn create_role(
    state: &AppState,
    name: String,
    persona: String,
    human: String,
    json: bool,
) -> Result<()> {
    let role = state
        .role_service
        .create_role(CreateRoleRequest { name, persona, human })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&role)?);
        return Ok(());
    }

    print_created(&role);
    Ok(())
}

fn print_created(role: &Role) {
    println!();
    println!("  {} Role created", style("✓").green().bold());
    println!();
    println!("  {}   {}", style("Name:").bold(), style(&role.name).cyan());
    println!("  {}     {}", style("ID:").bold(), style(role.id.to_string()).dim());
    println!(
        "  {}  {}",
        style("Agent:").bold(),
        role.agent_id.as_deref().unwrap_or("-")
    );
    println!();
}

/// Reconcile local roles with the upstream agent list.
pub async fn sync_roles(state: &AppState, no_prune: bool, json: bool) -> Result<()> {
    let prune = state.config.sync.prune && !no_prune;
    let report = state.role_service.sync_from_upstream(prune).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Synced {} agent(s) from {}",
        style("✓").green().bold(),
        report.count,
        style(&state.config.upstream.base_url).dim()
    );
    match report.deleted_count {
        Some(n) if n > 0 => println!("  {} Pruned {n} stale role(s)", style("•").dim()),
        Some(_) => println!("  {} Nothing to prune", style("•").dim()),
        None => println!("  {} Pruning skipped", style("•").dim()),
    }
    println!();
    Ok(())
}

/// Print the stored conversation of a role.
pub async fn show_history(state: &AppState, role_id: &str, json: bool) -> Result<()> {
    let role_id: RoleId = role_id
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid role id '{role_id}': {e}"))?;
    let messages = state.chat_service.history(&role_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("  {}", style("No messages yet.").dim());
        return Ok(());
    }

    println!();
    for message in &messages {
        let speaker = match message.role {
            MessageRole::User => style("you").cyan().bold(),
            MessageRole::Assistant => style("bot").magenta().bold(),
        };
        println!("  {speaker}  {}", message.content);
    }
    println!();
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{head}...")
}
