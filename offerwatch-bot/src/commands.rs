use offerwatch_core::{SetOutcome, WatchError, WatchManager};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

pub const WELCOME: &str =
    "Welcome! Use /postal [postal code1] [postal code2] ... to search for housing offers.";
pub const USAGE: &str =
    "Please provide at least one postal code. Usage: /postal [postal code1] [postal code2] ...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Postal(Vec<String>),
    Exit,
}

impl Command {
    /// Parses a chat message. `/cmd@botname` is accepted; anything that is
    /// not a known command yields `None`.
    pub fn from_chat(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?;
        let name = head.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" => Some(Command::Start),
            "postal" => Some(Command::Postal(words.map(str::to_owned).collect())),
            _ => None,
        }
    }

    /// Parses a console line: `exit` or a list of postal codes.
    pub fn from_console(line: &str) -> Self {
        if line.trim().eq_ignore_ascii_case("exit") {
            Command::Exit
        } else {
            Command::Postal(line.split_whitespace().map(str::to_owned).collect())
        }
    }
}

pub struct ControlRequest {
    pub command: Command,
    pub reply: oneshot::Sender<Vec<String>>,
}

pub type ControlSender = mpsc::Sender<ControlRequest>;

/// Sends `command` to the control task and waits for its replies.
pub async fn submit(control: &ControlSender, command: Command) -> Option<Vec<String>> {
    let (reply, replied) = oneshot::channel();
    control.send(ControlRequest { command, reply }).await.ok()?;
    replied.await.ok()
}

/// Serialises every command through the single manager instance. Returns
/// after an exit request, once the running watch has been joined.
pub async fn run_control(mut manager: WatchManager, mut requests: mpsc::Receiver<ControlRequest>) {
    while let Some(request) = requests.recv().await {
        let exit = request.command == Command::Exit;
        let replies = handle(&mut manager, request.command).await;
        let _ = request.reply.send(replies);
        if exit {
            break;
        }
    }
    manager.shutdown().await;
    info!("control loop finished");
}

async fn handle(manager: &mut WatchManager, command: Command) -> Vec<String> {
    match command {
        Command::Start => {
            let mut replies = vec![WELCOME.to_owned()];
            if let Err(e) = manager.resume().await {
                warn!(error = %e, "failed to resume saved postal codes");
                replies.push(format!("An error occurred: {e}"));
            }
            replies
        }
        Command::Postal(codes) => match manager.set_filters(codes).await {
            Ok(SetOutcome::Applied(_)) => Vec::new(),
            Ok(SetOutcome::Unchanged(filters)) => {
                vec![format!("Postal codes already set to {filters}.")]
            }
            Err(WatchError::EmptyFilters) => vec![USAGE.to_owned()],
            Err(e) => vec![format!("An error occurred: {e}")],
        },
        Command::Exit => {
            manager.shutdown().await;
            vec!["Stopped.".to_owned()]
        }
    }
}
