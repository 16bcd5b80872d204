//! Chat command - stream an answer from a chat app.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use console::Style;
use dify_client::{ChatMessageRequest, EventKind};
use futures::StreamExt;

use super::{parse_input, Context};

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// The message to send
    #[arg(required = true)]
    pub query: String,

    /// Continue an existing conversation
    #[arg(short, long)]
    pub conversation: Option<String>,

    /// App input variable (repeatable)
    #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, serde_json::Value)>,
}

/// Run the chat command.
pub async fn run(args: ChatArgs, ctx: &Context) -> Result<()> {
    let (client, resolved) = ctx.client()?;
    let dim = Style::new().dim();

    if ctx.verbose {
        eprintln!("{}", dim.apply_to(format!("Sending to: {}", client.base_url())));
        if let Some(ref conversation) = args.conversation {
            eprintln!("{}", dim.apply_to(format!("Conversation: {}", conversation)));
        }
    }

    let mut request = ChatMessageRequest::new(args.query, resolved.user);
    if let Some(conversation) = args.conversation {
        request = request.with_conversation(conversation);
    }
    for (key, value) in args.inputs {
        request = request.with_input(key, value);
    }

    let mut stream = client.chat().stream(request, ctx.cancel.clone()).await?;

    // Track if we've printed anything (for final newline)
    let mut has_output = false;
    let mut conversation_id = None;

    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                if has_output {
                    println!();
                }
                let red = Style::new().red();
                eprintln!("{} {}", red.apply_to("Error:"), e);
                return Err(e.into());
            }
        };
        if conversation_id.is_none() {
            conversation_id = event.conversation_id.clone();
        }

        if ctx.json_output {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }

        match event.event {
            EventKind::Message | EventKind::AgentMessage => {
                print!("{}", event.answer_text());
                std::io::stdout().flush()?;
                has_output = true;
            }
            EventKind::MessageReplace => {
                if has_output {
                    println!();
                }
                println!("{}", dim.apply_to("[answer replaced]"));
                print!("{}", event.answer_text());
                std::io::stdout().flush()?;
                has_output = true;
            }
            EventKind::AgentThought if ctx.verbose => {
                eprintln!("{}", dim.apply_to("[thinking]"));
            }
            EventKind::MessageEnd => {
                if has_output {
                    println!();
                    has_output = false;
                }
            }
            _ => tracing::debug!(kind = %event.event, "Skipping event"),
        }
    }

    if has_output {
        println!();
    }
    if ctx.cancel.is_cancelled() {
        eprintln!("{}", dim.apply_to("[cancelled]"));
    }
    if ctx.verbose
        && let Some(id) = conversation_id
    {
        eprintln!("{}", dim.apply_to(format!("Conversation: {}", id)));
    }

    Ok(())
}
