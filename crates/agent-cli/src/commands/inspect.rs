use crate::GlobalArgs;
use agent_core::Agent;
use agent_tools::ToolKind;
use agent_tutor::{TutorAssistant, check_structure};
use comfy_table::{Cell, Color, Table};

pub async fn execute(global: &GlobalArgs) -> anyhow::Result<()> {
    let context = global.process_context().await?;
    let assistant = TutorAssistant::assemble(&context)?;

    let mut agents = Table::new();
    agents.set_header(vec!["Agent", "Model", "Tools", "Delegates to", "Instruction"]);
    for agent in assistant.agents() {
        let tools = agent.tools();
        let delegates: Vec<&str> = tools
            .list_tools()
            .iter()
            .filter(|t| t.kind() == ToolKind::Agent)
            .map(|t| t.name())
            .collect();
        let functions: Vec<&str> = tools
            .list_tools()
            .iter()
            .filter(|t| t.kind() == ToolKind::Function)
            .map(|t| t.name())
            .collect();

        agents.add_row(vec![
            Cell::new(agent.name()),
            Cell::new(agent.model()),
            Cell::new(format!("{} {}", tools.len(), bracketed(&functions))),
            Cell::new(if delegates.is_empty() { "-".to_string() } else { delegates.join(", ") }),
            Cell::new(format!("{} chars", agent.instruction().chars().count())),
        ]);
    }
    println!("Routing policy {}", assistant.policy().version);
    println!("{agents}");

    let checks = check_structure(&assistant);
    let mut table = Table::new();
    table.set_header(vec!["Check", "Status", "Observed"]);
    for check in &checks {
        let status = if check.passed {
            Cell::new("ok").fg(Color::Green)
        } else {
            Cell::new("FAILED").fg(Color::Red)
        };
        table.add_row(vec![Cell::new(&check.name), status, Cell::new(&check.detail)]);
    }
    println!("{table}");

    let failed = checks.iter().filter(|c| !c.passed).count();
    if failed > 0 {
        anyhow::bail!("{failed} structure check(s) failed");
    }
    Ok(())
}

fn bracketed(names: &[&str]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!("({})", names.join(", "))
    }
}
