//! Terminal front end: one handler per user action, rendering results to stdout.

pub mod auth;
pub mod chat;
pub mod documents;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

pub(crate) type InputLines = Lines<BufReader<Stdin>>;

pub(crate) fn input_lines() -> InputLines {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Prints `prompt` and reads one line. `None` on end of input.
pub(crate) async fn prompt_line(
    input: &mut InputLines,
    prompt: &str,
) -> std::io::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    input.next_line().await
}
