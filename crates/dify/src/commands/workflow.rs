//! Workflow command - run a workflow and show node progress.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use dify_client::{
    NodeDetail, StreamEvent, TtsMessage, WorkflowDetail, WorkflowEventHandler, WorkflowRequest,
};
use serde_json::{Map, Value};

use super::{parse_input, Context};

/// Arguments for the workflow command.
#[derive(Args, Debug)]
pub struct WorkflowArgs {
    /// Workflow input variable (repeatable)
    #[arg(short, long = "input", value_name = "KEY=VALUE", value_parser = parse_input)]
    pub inputs: Vec<(String, Value)>,

    /// Wait for the run to finish instead of streaming progress
    #[arg(long)]
    pub blocking: bool,
}

/// Run the workflow command.
pub async fn run(args: WorkflowArgs, ctx: &Context) -> Result<()> {
    let (client, resolved) = ctx.client()?;

    let mut request = WorkflowRequest::new(resolved.user);
    for (key, value) in args.inputs {
        request = request.with_input(key, value);
    }

    if args.blocking {
        let response = client.workflows().run(request).await?;
        if ctx.json_output {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print_outputs(response.data.outputs.as_ref());
            if let Some(error) = response.data.error.filter(|e| !e.is_empty()) {
                anyhow::bail!("workflow {}: {}", response.data.status, error);
            }
        }
        return Ok(());
    }

    let mut progress = Progress::new(ctx.json_output, ctx.verbose);
    let result = client
        .workflows()
        .run_streaming(request, &ctx.cancel, &mut progress)
        .await;

    match result {
        Ok(()) => {
            if !ctx.json_output {
                print_outputs(progress.outputs.as_ref());
            }
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("{}", Style::new().dim().apply_to("[cancelled]"));
            Ok(())
        }
        Err(e) => {
            let red = Style::new().red();
            eprintln!("{} {}", red.apply_to("Error:"), e);
            Err(e.into())
        }
    }
}

fn print_outputs(outputs: Option<&Map<String, Value>>) {
    let Some(outputs) = outputs else {
        return;
    };
    println!("{}", style("Outputs").bold());
    for (key, value) in outputs {
        match value {
            Value::String(s) => println!("  {}: {}", key, s),
            other => println!("  {}: {}", key, other),
        }
    }
}

/// Prints node progress to stderr, or every event as a JSON line.
struct Progress {
    json: bool,
    verbose: bool,
    dim: Style,
    outputs: Option<Map<String, Value>>,
}

impl Progress {
    fn new(json: bool, verbose: bool) -> Self {
        Self {
            json,
            verbose,
            dim: Style::new().dim(),
            outputs: None,
        }
    }

    fn emit_json(&self, event: &StreamEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
        }
    }
}

fn node_title(node: &NodeDetail) -> &str {
    node.title
        .as_deref()
        .or(node.node_id.as_deref())
        .unwrap_or("node")
}

impl WorkflowEventHandler for Progress {
    fn on_workflow_started(&mut self, event: &StreamEvent, workflow: &WorkflowDetail) {
        if self.json {
            return self.emit_json(event);
        }
        let run_id = event
            .workflow_run_id
            .as_deref()
            .or(workflow.id.as_deref())
            .unwrap_or("?");
        eprintln!("{}", self.dim.apply_to(format!("Workflow run {}", run_id)));
    }

    fn on_node_started(&mut self, event: &StreamEvent, node: &NodeDetail) {
        if self.json {
            return self.emit_json(event);
        }
        eprintln!("{} {}", self.dim.apply_to("▸"), node_title(node));
    }

    fn on_node_finished(&mut self, event: &StreamEvent, node: &NodeDetail) {
        if self.json {
            return self.emit_json(event);
        }
        let elapsed = node
            .elapsed_time
            .map(|t| format!(" ({:.2}s)", t))
            .unwrap_or_default();
        match node.status.as_deref() {
            Some("succeeded") | None => eprintln!(
                "{} {}{}",
                Style::new().green().apply_to("✓"),
                node_title(node),
                self.dim.apply_to(elapsed)
            ),
            Some(status) => {
                let error = node
                    .error
                    .as_ref()
                    .map(|e| match e {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| status.to_string());
                eprintln!(
                    "{} {}: {}",
                    Style::new().red().apply_to("✗"),
                    node_title(node),
                    error
                );
            }
        }
    }

    fn on_workflow_finished(&mut self, event: &StreamEvent, workflow: &WorkflowDetail) {
        self.outputs = workflow.outputs.clone();
        if self.json {
            return self.emit_json(event);
        }
        let status = workflow.status.as_deref().unwrap_or("finished");
        let steps = workflow
            .total_steps
            .map(|n| format!(", {} steps", n))
            .unwrap_or_default();
        eprintln!(
            "{}",
            self.dim.apply_to(format!("Workflow {}{}", status, steps))
        );
    }

    fn on_event(&mut self, event: &StreamEvent) {
        if self.json {
            return self.emit_json(event);
        }
        if self.verbose {
            eprintln!("{}", self.dim.apply_to(format!("[{}]", event.event)));
        }
    }

    fn on_tts(&mut self, message: &TtsMessage) {
        tracing::trace!(bytes = message.audio.len(), "Ignoring TTS audio");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_title_fallbacks() {
        let titled = NodeDetail {
            title: Some("LLM".to_string()),
            node_id: Some("n1".to_string()),
            ..Default::default()
        };
        assert_eq!(node_title(&titled), "LLM");

        let untitled = NodeDetail {
            node_id: Some("n1".to_string()),
            ..Default::default()
        };
        assert_eq!(node_title(&untitled), "n1");
        assert_eq!(node_title(&NodeDetail::default()), "node");
    }

    #[test]
    fn test_progress_keeps_outputs() {
        let mut progress = Progress::new(true, false);
        let mut outputs = Map::new();
        outputs.insert("answer".to_string(), Value::from(42));
        let workflow = WorkflowDetail {
            outputs: Some(outputs),
            ..Default::default()
        };
        let event = StreamEvent {
            event: dify_client::EventKind::WorkflowFinished,
            task_id: None,
            id: None,
            conversation_id: None,
            message_id: None,
            workflow_run_id: None,
            created_at: None,
            answer: None,
            metadata: None,
            detail: dify_client::EventDetail::Workflow(workflow.clone()),
        };
        progress.on_workflow_finished(&event, &workflow);
        assert_eq!(progress.outputs.unwrap()["answer"], 42);
    }
}
