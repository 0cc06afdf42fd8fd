use std::io::{self, Write};

use chrono::Local;
use finassist_chat::{Author, Message, MessageId, ScrollTarget, SessionIssue, SessionState};

pub const PROMPT: &str = "> ";

/// Status line shown under the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Status {
    #[default]
    Idle,
    Loading,
    Sending,
    Issue(SessionIssue),
}

impl Status {
    fn of(state: &SessionState) -> Self {
        if let Some(issue) = state.issue() {
            Self::Issue(issue)
        } else if state.loading {
            Self::Loading
        } else if state.sending() {
            Self::Sending
        } else {
            Self::Idle
        }
    }

    fn line(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Loading => Some("carregando histórico...".to_string()),
            Self::Sending => Some("assistente digitando...".to_string()),
            Self::Issue(SessionIssue::HistoryLoadFailed(message)) => {
                Some(format!("{message} (use /reload)"))
            }
            Self::Issue(SessionIssue::UserUnavailable) => {
                Some("nenhum usuário conectado (use /login <id>)".to_string())
            }
        }
    }
}

/// Incrementally prints a session timeline to a line-oriented terminal.
///
/// Appends print only the new rows. When the timeline no longer starts with what
/// was printed (a reload replaced it) the whole transcript is printed again.
#[derive(Debug, Default)]
pub struct TranscriptRenderer {
    printed: Vec<MessageId>,
    status: Status,
}

impl TranscriptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, state: &SessionState, out: &mut impl Write) -> io::Result<()> {
        let is_append = state.messages.len() >= self.printed.len()
            && state
                .messages
                .iter()
                .zip(&self.printed)
                .all(|(message, printed)| message.id == *printed);

        let fresh = if is_append {
            &state.messages[self.printed.len()..]
        } else {
            writeln!(out, "── histórico atualizado ──")?;
            self.printed.clear();
            &state.messages[..]
        };

        for message in fresh {
            write_message(message, out)?;
            self.printed.push(message.id.clone());
        }

        let status = Status::of(state);
        if status != self.status {
            if let Some(line) = status.line() {
                writeln!(out, "· {line}")?;
            }
            self.status = status;
        }

        out.flush()
    }

    /// Like [`Self::render`], but starts on a fresh line below the prompt. Writes
    /// nothing when there is nothing new to show.
    pub fn render_below_prompt(
        &mut self,
        state: &SessionState,
        out: &mut impl Write,
    ) -> io::Result<()> {
        let mut rendered = Vec::new();
        self.render(state, &mut rendered)?;
        if rendered.is_empty() {
            return Ok(());
        }

        out.write_all(b"\n")?;
        out.write_all(&rendered)?;
        out.flush()
    }
}

fn write_message(message: &Message, out: &mut impl Write) -> io::Result<()> {
    let speaker = match message.author {
        Author::User => "você",
        Author::Assistant => "assistente",
    };
    let time = message.created_at.with_timezone(&Local).format("%H:%M");

    writeln!(out, "[{time}] {speaker}: {}", message.text)
}

/// Keeps the input prompt pinned under the newest transcript row.
pub struct PromptAnchor;

impl ScrollTarget for PromptAnchor {
    fn scroll_to_end(&self) {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{PROMPT}");
        let _ = stdout.flush();
    }
}
