use crate::GlobalArgs;
use agent_tutor::RouteDecision;

pub fn execute(global: &GlobalArgs, query: &str) -> anyhow::Result<()> {
    let policy = global.routing_policy()?;

    match policy.classify(query) {
        RouteDecision::Direct => println!("direct: the orchestrator answers itself"),
        RouteDecision::Open => println!("open: no keyword matched, the model decides"),
        RouteDecision::Delegate {
            intent,
            agent,
            matched,
        } => {
            println!("{intent} -> {agent}");
            println!("matched: {}", matched.join(", "));
            if let Some(route) = policy.route_for(&agent) {
                println!("strategy: {}", route.strategy);
                if !route.combine_with.is_empty() {
                    println!("may also involve: {}", route.combine_with.join(", "));
                }
            }
        }
    }
    Ok(())
}
