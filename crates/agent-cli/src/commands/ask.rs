use crate::GlobalArgs;
use crate::trace;
use agent_tutor::TutorAssistant;

pub async fn execute(global: &GlobalArgs, query: &str, session: &str, show_trace: bool) -> anyhow::Result<()> {
    let context = global.process_context().await?;
    let assistant = TutorAssistant::assemble(&context)?;

    let answer = assistant.answer(query, &TutorAssistant::session(session)).await;
    println!("{}", answer.text);

    if show_trace {
        println!();
        trace::print_trace(&answer);
    }
    if let Some(error) = &answer.error {
        anyhow::bail!("request failed: {error}");
    }
    Ok(())
}
