use crate::GlobalArgs;
use crate::trace::{self, ActivityPrinter};
use agent_tutor::{TutorAnswer, TutorAssistant};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Each line is a fresh request; only the session id is shared between turns
const HELP: &str = "\
Commandes :
  /exit  - quitter
  /help  - afficher cette aide
  /trace - outils appelés pour la dernière réponse

Chaque question est traitée seule : l'assistant ne se souvient pas des
questions précédentes. Reformule ta question en entier si besoin.";

pub async fn execute(global: &GlobalArgs, session: &str) -> anyhow::Result<()> {
    let context = global.process_context().await?;
    let assistant = TutorAssistant::assemble_with_handler(&context, Some(Arc::new(ActivityPrinter)))?;
    let request_context = TutorAssistant::session(session);

    println!(
        "Assistant scolaire ({} agents, session {session}). Chaque question est traitée seule ; /help pour l'aide.",
        assistant.agents().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last: Option<TutorAnswer> = None;
    loop {
        print!("élève> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "/exit" | "/quit" => break,
            "/help" => println!("{HELP}"),
            "/trace" => match &last {
                Some(answer) => trace::print_trace(answer),
                None => println!("Aucune réponse pour l'instant."),
            },
            query => {
                let answer = assistant.answer(query, &request_context).await;
                println!("\n{}\n", answer.text);
                last = Some(answer);
            }
        }
    }

    println!("À bientôt !");
    Ok(())
}
