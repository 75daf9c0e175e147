//! Walk-in CLI - Command-line interface for the walk-in queue daemon

mod rpc;
mod view;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rpc::{
    CallNext, Daily, Provider, QueueSnapshot, Registered, RpcClient, Stats, Status, Ticket,
    TicketView,
};
use serde_json::json;
use tabled::Table;
use view::{ProviderDayRow, ProviderRow, ProviderStatsRow, TicketRow, WaitingRow};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9610";

#[derive(Parser)]
#[command(name = "walkin")]
#[command(about = "Walk-in queue CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "WALKIN_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage providers
    Providers {
        #[command(subcommand)]
        action: ProviderCommand,
    },

    /// Register a walk-in client
    Register {
        /// Client name
        name: String,

        /// Number handed to the client
        #[arg(short = 'n', long)]
        number: i64,

        /// Provider id or name
        #[arg(short, long)]
        provider: String,
    },

    /// Call the next waiting client
    Next {
        /// Provider id or name
        provider: String,
    },

    /// Finish the service of a ticket
    Complete {
        /// Ticket ID
        ticket_id: String,
    },

    /// Cancel a ticket
    Cancel {
        /// Ticket ID
        ticket_id: String,
    },

    /// Look up tickets
    Ticket {
        #[command(subcommand)]
        action: TicketCommand,
    },

    /// Show the queues
    Queue {
        /// Only this provider (id or name)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Show system status
    Status,

    /// Service statistics
    Stats {
        /// today, week, month, year or all
        #[arg(long, default_value = "today")]
        period: String,

        /// Only this provider (id or name)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Today's per-provider summary
    Daily,

    /// Finished tickets
    History {
        /// Only this provider (id or name)
        #[arg(short, long)]
        provider: Option<String>,

        /// Created at or after (epoch ms)
        #[arg(long)]
        from: Option<i64>,

        /// Created before (epoch ms)
        #[arg(long)]
        to: Option<i64>,
    },
}

#[derive(Subcommand)]
enum ProviderCommand {
    /// List providers
    List,
    /// Add a provider
    Add { name: String },
    /// Accept new registrations again
    Activate { provider: String },
    /// Stop accepting new registrations
    Deactivate { provider: String },
    /// Remove a provider with no active tickets
    Remove { provider: String },
}

#[derive(Subcommand)]
enum TicketCommand {
    /// Show a ticket by ID
    Show { ticket_id: String },
    /// Find the active ticket holding a number
    Find { number: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = RpcClient::new(cli.rpc_url);

    match cli.command {
        Commands::Providers { action } => providers(&client, action).await?,

        Commands::Register {
            name,
            number,
            provider,
        } => {
            let provider = resolve_provider(&client, &provider).await?;
            let params = json!({
                "name": name,
                "display_number": number,
                "provider_id": provider.id,
            });
            let registered: Registered = client.call("ticket.register.v1", params).await?;

            println!(
                "{}",
                format!(
                    "✓ #{} registered with {} (position {})",
                    registered.display_number, provider.name, registered.position
                )
                .green()
                .bold()
            );
            println!("  Ticket: {}", registered.ticket_id);
        }

        Commands::Next { provider } => {
            let provider = resolve_provider(&client, &provider).await?;
            let params = json!({ "provider_id": provider.id });
            let next: CallNext = client.call("queue.call_next.v1", params).await?;

            match next.ticket {
                Some(ticket) => {
                    println!(
                        "{}",
                        format!(
                            "▶ {} now serving #{} {}",
                            provider.name, ticket.display_number, ticket.client_name
                        )
                        .green()
                        .bold()
                    );
                    println!("  Ticket: {}", ticket.id);
                }
                None => println!("{}", format!("Nobody waiting for {}", provider.name).yellow()),
            }
        }

        Commands::Complete { ticket_id } => {
            let params = json!({ "ticket_id": ticket_id });
            let ticket: Ticket = client.call("ticket.complete.v1", params).await?;
            println!(
                "{}",
                format!("✓ #{} {} completed", ticket.display_number, ticket.client_name)
                    .green()
                    .bold()
            );
        }

        Commands::Cancel { ticket_id } => {
            let params = json!({ "ticket_id": ticket_id });
            let ticket: Ticket = client.call("ticket.cancel.v1", params).await?;
            println!(
                "{}",
                format!("✓ #{} {} cancelled", ticket.display_number, ticket.client_name)
                    .green()
                    .bold()
            );
        }

        Commands::Ticket { action } => {
            let view: TicketView = match action {
                TicketCommand::Show { ticket_id } => {
                    client
                        .call("ticket.get.v1", json!({ "ticket_id": ticket_id }))
                        .await?
                }
                TicketCommand::Find { number } => {
                    client
                        .call("ticket.find.v1", json!({ "display_number": number }))
                        .await?
                }
            };
            println!("{}", Table::new([TicketRow::from(&view.ticket)]));
            println!("  {} {}", "Ticket:".bold(), view.ticket.id);
            if let Some(position) = view.position {
                println!("  {} {}", "Position:".bold(), position);
            }
        }

        Commands::Queue { provider } => {
            let provider_id = match provider {
                Some(key) => Some(resolve_provider(&client, &key).await?.id),
                None => None,
            };
            let queues: Vec<QueueSnapshot> = client
                .call("queue.snapshot.v1", json!({ "provider_id": provider_id }))
                .await?;
            print_queues(&queues);
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match client.call::<Status>("admin.status.v1", json!({})).await {
                Ok(status) => {
                    println!("  {} {}", "RPC URL:".bold(), client.url());
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), status.version);
                    println!();
                    println!(
                        "  {} {}/{}",
                        "Providers:".bold(),
                        status.providers_active,
                        status.providers_total
                    );
                    println!("  {} {}", "Waiting:".bold(), status.waiting_count);
                    println!("  {} {}", "Serving:".bold(), status.serving_count);
                    println!();
                    println!("  {} {} seconds", "Uptime:".bold(), status.uptime_seconds);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Stats { period, provider } => {
            let provider_id = match provider {
                Some(key) => Some(resolve_provider(&client, &key).await?.id),
                None => None,
            };
            let params = json!({ "period": period, "provider_id": provider_id });
            let stats: Stats = client.call("report.stats.v1", params).await?;
            print_stats(&stats);
        }

        Commands::Daily => {
            let daily: Daily = client.call("report.daily.v1", json!({})).await?;
            println!(
                "{}",
                format!("Daily summary {}", view::date(daily.day_start))
                    .cyan()
                    .bold()
            );
            println!("  {} {}", "Completed:".bold(), daily.completed_count);
            if !daily.providers.is_empty() {
                let rows: Vec<ProviderDayRow> = daily.providers.iter().map(Into::into).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::History { provider, from, to } => {
            let provider_id = match provider {
                Some(key) => Some(history_provider_id(&client, &key).await?),
                None => None,
            };
            let params = json!({ "provider_id": provider_id, "from": from, "to": to });
            let tickets: Vec<Ticket> = client.call("report.history.v1", params).await?;
            if tickets.is_empty() {
                println!("{}", "No finished tickets".yellow());
            } else {
                let rows: Vec<TicketRow> = tickets.iter().map(Into::into).collect();
                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}

async fn providers(client: &RpcClient, action: ProviderCommand) -> Result<()> {
    match action {
        ProviderCommand::List => {
            let providers: Vec<Provider> = client.call("provider.list.v1", json!({})).await?;
            if providers.is_empty() {
                println!("{}", "No providers".yellow());
            } else {
                let rows: Vec<ProviderRow> = providers.iter().map(Into::into).collect();
                println!("{}", Table::new(rows));
            }
        }
        ProviderCommand::Add { name } => {
            let provider: Provider = client
                .call("provider.create.v1", json!({ "name": name }))
                .await?;
            println!(
                "{}",
                format!("✓ Provider {} added", provider.name).green().bold()
            );
            println!("  ID: {}", provider.id);
        }
        ProviderCommand::Activate { provider } => set_active(client, &provider, true).await?,
        ProviderCommand::Deactivate { provider } => set_active(client, &provider, false).await?,
        ProviderCommand::Remove { provider } => {
            let provider = resolve_provider(client, &provider).await?;
            client
                .call::<serde_json::Value>(
                    "provider.remove.v1",
                    json!({ "provider_id": provider.id }),
                )
                .await?;
            println!(
                "{}",
                format!("✓ Provider {} removed", provider.name).green().bold()
            );
        }
    }
    Ok(())
}

async fn set_active(client: &RpcClient, key: &str, active: bool) -> Result<()> {
    let provider = resolve_provider(client, key).await?;
    let params = json!({ "provider_id": provider.id, "active": active });
    let updated: Provider = client.call("provider.set_active.v1", params).await?;
    let label = if updated.active { "activated" } else { "deactivated" };
    println!(
        "{}",
        format!("✓ Provider {} {}", updated.name, label).green().bold()
    );
    Ok(())
}

/// Accept either a provider id or its exact name
async fn resolve_provider(client: &RpcClient, key: &str) -> Result<Provider> {
    let providers: Vec<Provider> = client.call("provider.list.v1", json!({})).await?;
    find_provider(providers, key).with_context(|| format!("No provider with id or name '{}'", key))
}

/// History outlives removal, so an unlisted key is sent as a raw id
async fn history_provider_id(client: &RpcClient, key: &str) -> Result<String> {
    let providers: Vec<Provider> = client.call("provider.list.v1", json!({})).await?;
    Ok(find_provider(providers, key)
        .map(|p| p.id)
        .unwrap_or_else(|| key.to_string()))
}

fn find_provider(providers: Vec<Provider>, key: &str) -> Option<Provider> {
    providers
        .into_iter()
        .find(|p| p.id == key || p.name == key.trim())
}

fn print_queues(queues: &[QueueSnapshot]) {
    if queues.is_empty() {
        println!("{}", "No providers".yellow());
        return;
    }
    for queue in queues {
        let status = if queue.provider.active {
            "open".green()
        } else {
            "closed".red()
        };
        println!("{} [{}]", queue.provider.name.cyan().bold(), status);
        match &queue.serving {
            Some(s) => println!(
                "  {} #{} {} (since {})",
                "Serving:".bold(),
                s.display_number,
                s.client_name,
                view::clock(s.called_at)
            ),
            None => println!("  {} -", "Serving:".bold()),
        }
        if queue.waiting.is_empty() {
            println!("  {} none", "Waiting:".bold());
        } else {
            let rows: Vec<WaitingRow> = queue.waiting.iter().map(Into::into).collect();
            println!("{}", Table::new(rows));
        }
        println!();
    }
}

fn print_stats(stats: &Stats) {
    let t = &stats.totals;
    println!("{}", format!("Statistics ({})", stats.period).cyan().bold());
    println!();
    println!("  {} {}", "Finished:".bold(), t.finished_count);
    println!("  {} {}", "Completed:".bold(), t.completed_count);
    println!("  {} {}", "Cancelled:".bold(), t.cancelled_count);
    println!("  {} {}", "In progress:".bold(), t.in_progress_count);
    println!();
    println!("  {} {}", "Avg wait:".bold(), view::duration(t.avg_wait_ms));
    println!("  {} {}", "Avg service:".bold(), view::duration(t.avg_service_ms));
    println!("  {} {}", "Avg total:".bold(), view::duration(t.avg_total_ms));

    if !stats.per_provider.is_empty() {
        println!();
        let rows: Vec<ProviderStatsRow> = stats.per_provider.iter().map(Into::into).collect();
        println!("{}", Table::new(rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Provider> {
        vec![
            Provider {
                id: "p-1".to_string(),
                name: "Carlos".to_string(),
                active: true,
            },
            Provider {
                id: "p-2".to_string(),
                name: "Dora".to_string(),
                active: false,
            },
        ]
    }

    #[test]
    fn test_find_provider_by_id_or_name() {
        assert_eq!(find_provider(roster(), "p-2").map(|p| p.name), Some("Dora".to_string()));
        assert_eq!(find_provider(roster(), " Carlos ").map(|p| p.id), Some("p-1".to_string()));
        assert!(find_provider(roster(), "Elena").is_none());
    }

    #[test]
    fn test_history_accepts_provider_name() {
        let cli = Cli::try_parse_from(["walkin", "history", "--provider", "Carlos"]).unwrap();
        let Commands::History { provider, .. } = cli.command else {
            panic!("expected history");
        };
        let key = provider.unwrap();
        assert_eq!(find_provider(roster(), &key).map(|p| p.id), Some("p-1".to_string()));
    }
}
