//! Incremental console rendering of history snapshots.
//!
//! The renderer remembers how much of each message it has already written,
//! so feeding it successive snapshots prints streamed text as it grows.

use std::collections::{HashMap, HashSet};
use vigil_core::history::HistorySnapshot;
use vigil_core::message::{Message, MessageId, MessageStatus, Role};

const ASSISTANT_PREFIX: &str = "  VIGIL > ";
const NOTICE_PREFIX: &str = "  · ";

#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    /// Bytes of each assistant body already written.
    written: HashMap<MessageId, usize>,
    /// Assistant messages whose closing line has been written.
    closed: HashSet<MessageId>,
    /// Last notice text shown, per notice id.
    notices: HashMap<MessageId, String>,
    /// Highest version rendered; older snapshots are ignored.
    version: u64,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to print so the console reflects `snapshot`.
    pub fn render(&mut self, snapshot: &HistorySnapshot) -> String {
        if snapshot.version < self.version {
            return String::new();
        }
        self.version = snapshot.version;

        let mut out = String::new();

        // A reply removed while open still needs its line ended
        let vanished: Vec<MessageId> = self
            .written
            .keys()
            .filter(|id| !self.closed.contains(*id) && snapshot.get(**id).is_none())
            .copied()
            .collect();
        for id in vanished {
            out.push('\n');
            self.closed.insert(id);
        }

        for message in snapshot.iter() {
            match message.role {
                Role::User => {}
                Role::Notice => self.render_notice(message, &mut out),
                Role::Assistant => self.render_reply(message, &mut out),
            }
        }
        out
    }

    fn render_notice(&mut self, message: &Message, out: &mut String) {
        if self.notices.get(&message.id) == Some(&message.content) {
            return;
        }
        out.push_str(NOTICE_PREFIX);
        out.push_str(&message.content);
        out.push('\n');
        self.notices.insert(message.id, message.content.clone());
    }

    fn render_reply(&mut self, message: &Message, out: &mut String) {
        if self.closed.contains(&message.id) {
            return;
        }

        let written = match self.written.get(&message.id) {
            Some(written) => *written,
            None => {
                out.push_str(ASSISTANT_PREFIX);
                0
            }
        };

        if let Some(fresh) = message.content.get(written..) {
            out.push_str(&fresh.replace('\n', &format!("\n{}", " ".repeat(ASSISTANT_PREFIX.len()))));
        }
        self.written.insert(message.id, message.content.len());

        match message.status {
            MessageStatus::Streaming => {}
            MessageStatus::Complete => out.push('\n'),
            MessageStatus::Failed => out.push_str("  [failed]\n"),
            MessageStatus::Cancelled => out.push_str("  [cancelled]\n"),
        }
        if message.status != MessageStatus::Streaming {
            self.closed.insert(message.id);
        }
    }
}
