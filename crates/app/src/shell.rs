use std::sync::Arc;

use finassist_chat::{
    ChatService, ChatSessionController, MockChatService, ScrollScheduler, UserResolution, ViewHint,
    ViewHintReceiver,
};
use finassist_client::{ClientError, HttpChatService};
use snafu::{ResultExt, Snafu};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::command::{HELP_TEXT, ShellCommand};
use crate::settings::{AppSettings, Backend, SettingsStore};
use crate::transcript::{PROMPT, PromptAnchor, TranscriptRenderer};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AppError {
    #[snafu(display("failed to set up chat backend on `{stage}`: {source}"))]
    ChatBackend {
        stage: &'static str,
        source: ClientError,
    },
    #[snafu(display("failed to read terminal input on `{stage}`: {source}"))]
    ReadInput {
        stage: &'static str,
        source: std::io::Error,
    },
}

pub fn build_service(settings: &AppSettings) -> Result<Arc<dyn ChatService>, AppError> {
    match settings.backend {
        Backend::Mock => {
            tracing::info!("using in-memory chat backend");
            Ok(Arc::new(
                MockChatService::new().with_latency(settings.mock_latency()),
            ))
        }
        Backend::Http => {
            let service = HttpChatService::new(settings.to_http_config()).context(ChatBackendSnafu {
                stage: "build-http-chat-service",
            })?;
            tracing::info!(base_url = %service.base_url(), "using HTTP chat backend");
            Ok(Arc::new(service))
        }
    }
}

/// Line-oriented chat screen: renders the timeline and forwards typed lines.
pub struct Shell {
    store: SettingsStore,
    controller: ChatSessionController,
    hints: Option<ViewHintReceiver>,
}

impl Shell {
    pub fn new(store: SettingsStore) -> Result<Self, AppError> {
        let service = build_service(&store.settings())?;
        let (controller, hints) = ChatSessionController::new(service);

        Ok(Self {
            store,
            controller,
            hints: Some(hints),
        })
    }

    pub async fn run(mut self) -> Result<(), AppError> {
        let view_task = self
            .hints
            .take()
            .map(|hints| tokio::spawn(drive_view(self.controller.clone(), hints)));

        println!("finassist · assistente financeiro ({})", self.store.config_path().display());
        println!("digite /help para ver os comandos");

        // Identity is restored from settings; the screen starts out waiting for it.
        self.controller
            .activate(UserResolution::from_provider(None, true))
            .await;
        self.spawn_activation(self.store.settings().resolution());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context(ReadInputSnafu {
            stage: "read-stdin-line",
        })? {
            match ShellCommand::parse(&line) {
                ShellCommand::Send(text) => self.submit(text),
                ShellCommand::Reload => {
                    let controller = self.controller.clone();
                    tokio::spawn(async move { controller.reload().await });
                }
                ShellCommand::Login(user_id) => {
                    self.switch_user(user_id.clone());
                    self.spawn_activation(UserResolution::signed_in(user_id.as_str()));
                }
                ShellCommand::Logout => {
                    self.switch_user(String::new());
                    self.spawn_activation(UserResolution::signed_out());
                }
                ShellCommand::Help => println!("{HELP_TEXT}"),
                ShellCommand::Quit => break,
                ShellCommand::Unknown(raw) => println!("comando desconhecido: {raw}"),
            }
        }

        if let Some(view_task) = view_task {
            view_task.abort();
        }
        Ok(())
    }

    /// Pre-validates like a disabled send button would, then runs the cycle in the background.
    fn submit(&self, text: String) {
        if text.trim().is_empty() {
            return;
        }
        if self.controller.snapshot().sending() {
            println!("· aguarde a resposta anterior");
            return;
        }

        let controller = self.controller.clone();
        tokio::spawn(async move {
            let outcome = controller.send(&text).await;
            tracing::debug!(?outcome, "send finished");
        });
    }

    fn spawn_activation(&self, resolution: UserResolution) {
        let controller = self.controller.clone();
        tokio::spawn(async move { controller.activate(resolution).await });
    }

    fn switch_user(&self, user_id: String) {
        let mut settings = AppSettings::clone(&self.store.settings());
        settings.user_id = user_id;
        if let Err(error) = self.store.update(settings) {
            tracing::warn!("failed to persist signed-in user: {error}");
        }
    }
}

async fn drive_view(controller: ChatSessionController, mut hints: ViewHintReceiver) {
    let scheduler = ScrollScheduler::new(Arc::new(PromptAnchor));
    let mut renderer = TranscriptRenderer::new();

    while let Some(hint) = hints.recv().await {
        if hint == ViewHint::StateChanged {
            let snapshot = controller.snapshot();
            let mut stdout = std::io::stdout().lock();
            if let Err(error) = renderer.render_below_prompt(&snapshot, &mut stdout) {
                tracing::warn!("failed to render transcript: {error}");
            }
        }
        scheduler.observe(hint);
    }

    tracing::debug!("view hint channel closed");
    print!("{PROMPT}");
}
