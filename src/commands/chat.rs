use super::{input_lines, prompt_line};
use crate::app::App;
use crate::error::ClientError;
use crate::models::ChatMessage;

pub async fn ask(app: &mut App, question: &str) -> Result<(), ClientError> {
    app.ask(question).await?;
    if let Some(reply) = app.transcript().last() {
        print_reply(reply);
    }
    Ok(())
}

/// Interactive loop. One question is in flight at a time; the prompt only
/// comes back once the previous answer arrived.
pub async fn chat(app: &mut App) -> Result<(), ClientError> {
    println!("Ask about your documents. Type `exit` to leave.");
    let mut input = input_lines();
    while let Some(line) = prompt_line(&mut input, "> ").await? {
        let question = line.trim();
        if question == "exit" || question == "quit" {
            break;
        }
        match app.ask(question).await {
            Ok(_) => {
                if let Some(reply) = app.transcript().last() {
                    print_reply(reply);
                }
            }
            Err(ClientError::EmptyQuestion) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn print_reply(reply: &ChatMessage) {
    if reply.failed {
        println!("bot (no answer): {}", reply.text);
        return;
    }
    println!("bot: {}", reply.text);
    for source in &reply.sources {
        println!("  - {}", source);
    }
}
