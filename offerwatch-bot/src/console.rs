use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::commands::{submit, Command, ControlSender};

const PROMPT: &str = "Enter postal codes separated by spaces (or 'exit' to quit): ";

/// Reads commands from stdin until `exit` or end of input.
pub async fn run_console(control: ControlSender) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let _ = stdout.write_all(PROMPT.as_bytes()).await;
        let _ = stdout.flush().await;

        let command = match lines.next_line().await {
            Ok(Some(line)) => Command::from_console(&line),
            Ok(None) => Command::Exit,
            Err(e) => {
                warn!(error = %e, "failed to read from stdin");
                Command::Exit
            }
        };
        let exit = command == Command::Exit;
        let Some(replies) = submit(&control, command).await else {
            return;
        };
        for reply in replies {
            let _ = stdout.write_all(format!("{reply}\n").as_bytes()).await;
        }
        if exit {
            return;
        }
    }
}
