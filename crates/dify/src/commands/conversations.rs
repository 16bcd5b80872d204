//! Conversations command - list, inspect and rename conversations.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use dify_client::{ConversationVariablesQuery, ConversationsQuery, RenameConversationRequest};

use super::Context;

/// Arguments for the conversations command.
#[derive(Args, Debug)]
pub struct ConversationsArgs {
    #[command(subcommand)]
    pub command: ConversationsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConversationsCommand {
    /// List recent conversations
    List {
        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,

        /// Continue after this conversation id
        #[arg(long)]
        last_id: Option<String>,
    },

    /// Show the variables stored on a conversation
    Variables {
        /// Conversation id
        conversation_id: String,

        /// Only show the variable with this name
        #[arg(short, long)]
        name: Option<String>,

        /// Page size (1-100)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Continue after this variable id
        #[arg(long)]
        last_id: Option<String>,
    },

    /// Rename a conversation
    Rename {
        /// Conversation id
        conversation_id: String,

        /// New name
        #[arg(required_unless_present = "auto")]
        name: Option<String>,

        /// Let the server generate a name
        #[arg(long, conflicts_with = "name")]
        auto: bool,
    },
}

/// Run the conversations command.
pub async fn run(args: ConversationsArgs, ctx: &Context) -> Result<()> {
    let (client, resolved) = ctx.client()?;
    let api = client.conversations();
    let dim = Style::new().dim();

    match args.command {
        ConversationsCommand::List { limit, last_id } => {
            let page = api
                .list(ConversationsQuery {
                    user: resolved.user,
                    last_id,
                    limit,
                })
                .await?;

            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }

            println!("{}", style("Conversations").bold());
            println!("{}", dim.apply_to("─".repeat(50)));
            if page.data.is_empty() {
                println!("{}", dim.apply_to("No conversations found"));
            }
            for conversation in &page.data {
                let name = if conversation.name.is_empty() {
                    "(untitled)"
                } else {
                    &conversation.name
                };
                println!("{}  {}", dim.apply_to(&conversation.id), name);
            }
            if page.has_more
                && let Some(last) = page.data.last()
            {
                println!();
                println!(
                    "{}",
                    dim.apply_to(format!("More available: --last-id {}", last.id))
                );
            }
        }
        ConversationsCommand::Variables {
            conversation_id,
            name,
            limit,
            last_id,
        } => {
            let page = api
                .variables(ConversationVariablesQuery {
                    conversation_id,
                    user: resolved.user,
                    last_id,
                    limit,
                    variable_name: name,
                })
                .await?;

            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }

            if page.data.is_empty() {
                println!("{}", dim.apply_to("No variables found"));
            }
            for variable in &page.data {
                let value = match &variable.value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                println!(
                    "{} {} {}",
                    style(&variable.name).bold(),
                    dim.apply_to(format!("({})", variable.value_type)),
                    value
                );
            }
        }
        ConversationsCommand::Rename {
            conversation_id,
            name,
            auto,
        } => {
            let response = api
                .rename(
                    &conversation_id,
                    RenameConversationRequest {
                        name,
                        auto_generate: auto.then_some(true),
                        user: resolved.user,
                    },
                )
                .await?;

            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                let green = Style::new().green();
                println!(
                    "{} Renamed to: {}",
                    green.apply_to("✓"),
                    response.name.as_deref().unwrap_or("(server generated)")
                );
            }
        }
    }

    Ok(())
}
