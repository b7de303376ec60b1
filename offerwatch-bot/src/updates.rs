use std::time::Duration;

use offerwatch_core::TelegramClient;
use tracing::{debug, warn};

use crate::commands::{submit, Command, ControlSender};

const LONG_POLL_SECS: u64 = 30;

/// Long-polls the Bot API and forwards recognised commands to the control
/// task, answering in the chat they came from.
pub async fn run_updates(telegram: TelegramClient, control: ControlSender, backoff: Duration) {
    let mut offset: Option<i64> = None;
    loop {
        let updates = match telegram.get_updates(offset, LONG_POLL_SECS).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "failed to fetch telegram updates");
                tokio::time::sleep(backoff).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = message.text.as_deref().and_then(Command::from_chat) else {
                continue;
            };
            debug!(chat = message.chat.id, ?command, "command received");

            let Some(replies) = submit(&control, command).await else {
                return;
            };
            let chat_id = message.chat.id.to_string();
            for reply in replies {
                if let Err(e) = telegram
                    .send_message(&chat_id, &reply, Some(message.message_id))
                    .await
                {
                    warn!(error = %e, "failed to reply");
                }
            }
        }
    }
}
