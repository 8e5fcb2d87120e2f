//! Rendering of tool activity

use agent_runtime::ExecutorEventHandler;
use agent_tools::{InvocationOutcome, ToolInvocation, ToolKind};
use agent_tutor::TutorAnswer;
use async_trait::async_trait;
use comfy_table::Table;
use serde_json::Value;

const PREVIEW_CHARS: usize = 80;

/// Prints tool calls as they happen
pub struct ActivityPrinter;

#[async_trait]
impl ExecutorEventHandler for ActivityPrinter {
    async fn on_tool_start(&self, agent: &str, name: &str, input: &Value) {
        println!("  [{agent}] -> {name} {input}");
    }

    async fn on_tool_done(
        &self,
        agent: &str,
        name: &str,
        result: std::result::Result<&str, &str>,
        duration_ms: u64,
    ) {
        match result {
            Ok(_) => println!("  [{agent}] <- {name} ({duration_ms} ms)"),
            Err(error) => println!("  [{agent}] <- {name} failed after {duration_ms} ms: {error}"),
        }
    }
}

/// Print the invocation tree behind `answer`
pub fn print_trace(answer: &TutorAnswer) {
    if let Some(error) = &answer.error {
        println!("Request failed: {error}");
    }
    if answer.invocations.is_empty() {
        println!("Answered directly ({} iteration(s))", answer.iterations);
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Call", "Kind", "Query", "Status", "ms"]);
    for invocation in &answer.invocations {
        add_rows(&mut table, invocation, 0);
    }
    println!("{table}");
}

fn add_rows(table: &mut Table, invocation: &ToolInvocation, depth: usize) {
    let kind = match invocation.kind {
        ToolKind::Agent => "agent",
        ToolKind::Function => "function",
    };
    let status = match &invocation.outcome {
        InvocationOutcome::Success { content } => format!("ok, {}", preview(content)),
        InvocationOutcome::Failure { error } => format!("failed: {}", preview(error)),
    };
    table.add_row(vec![
        format!("{}{}", "  ".repeat(depth), invocation.tool),
        kind.to_string(),
        invocation.sub_query().unwrap_or("-").to_string(),
        status,
        invocation.duration_ms.to_string(),
    ]);
    for child in &invocation.nested {
        add_rows(table, child, depth + 1);
    }
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS || text.lines().nth(1).is_some() {
        let head: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}
