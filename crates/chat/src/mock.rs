use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::message::{Author, Message, MessageId, SendReply, UserId};
use crate::service::{BoxFuture, ChatService, NetworkSnafu, ServerSnafu, ServiceResult};

const DEFAULT_REPLY: &str = "Posso ajudar com cartões, financiamentos, despesas fixas, investimentos e receitas. Sobre o que quer falar?";

/// Keyword table for canned advice, checked in order against the lowercased message.
const CANNED_REPLIES: &[(&[&str], &str)] = &[
    (
        &["economizar", "poupar", "gastos"],
        "Revise assinaturas e serviços recorrentes. Cancelar o que não usa costuma liberar de 5% a 10% do orçamento.",
    ),
    (
        &["cartão", "cartao", "fatura"],
        "Concentre as compras em um cartão e pague a fatura integral para evitar juros rotativos.",
    ),
    (
        &["financiamento", "parcela", "empréstimo", "emprestimo"],
        "Compare o CET das propostas e avalie amortizar parcelas quando sobrar caixa.",
    ),
    (
        &["investir", "investimento", "cdb", "tesouro"],
        "Monte primeiro uma reserva de emergência em aplicação com liquidez diária, depois diversifique.",
    ),
    (
        &["receita", "renda", "salário", "salario"],
        "Registre todas as fontes de renda para acompanhar quanto sobra no fim do mês.",
    ),
];

/// In-memory chat backend for local runs and demos.
///
/// Histories are kept per user for the life of the process. Failures can be
/// switched on to exercise degraded paths.
pub struct MockChatService {
    histories: RwLock<HashMap<UserId, Vec<Message>>>,
    latency: Duration,
    fail_history: AtomicBool,
    fail_send: AtomicBool,
    next_reply_id: AtomicU64,
}

impl MockChatService {
    pub fn new() -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            latency: Duration::ZERO,
            fail_history: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            next_reply_id: AtomicU64::new(1),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn seed_history(&self, user_id: UserId, messages: Vec<Message>) {
        self.histories.write().await.insert(user_id, messages);
    }

    pub fn set_fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::Relaxed);
    }

    /// Picks the canned answer for `text`.
    pub fn canned_reply(text: &str) -> &'static str {
        let lowered = text.to_lowercase();
        CANNED_REPLIES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(_, reply)| *reply)
            .unwrap_or(DEFAULT_REPLY)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MockChatService {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatService for MockChatService {
    fn fetch_history<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, ServiceResult<Vec<Message>>> {
        Box::pin(async move {
            self.simulate_latency().await;
            if self.fail_history.load(Ordering::Relaxed) {
                return ServerSnafu {
                    stage: "mock-fetch-history",
                    status: 503u16,
                    body: "history unavailable",
                }
                .fail();
            }

            let histories = self.histories.read().await;
            Ok(histories.get(user_id).cloned().unwrap_or_default())
        })
    }

    fn send_message<'a>(
        &'a self,
        user_id: &'a UserId,
        text: &'a str,
    ) -> BoxFuture<'a, ServiceResult<SendReply>> {
        Box::pin(async move {
            self.simulate_latency().await;
            if self.fail_send.load(Ordering::Relaxed) {
                return NetworkSnafu {
                    stage: "mock-send-message",
                    message: "connection reset",
                }
                .fail();
            }

            let sequence = self.next_reply_id.fetch_add(1, Ordering::Relaxed);
            let now = Utc::now();
            let reply = SendReply::new(Self::canned_reply(text))
                .with_reply_id(format!("mock-{sequence}"))
                .with_replied_at(now);

            // The server keeps its own copy of both turns; the client's draft id never comes back.
            let mut histories = self.histories.write().await;
            let history = histories.entry(user_id.clone()).or_default();
            history.push(Message::new(
                MessageId::confirmed(format!("mock-user-{sequence}")),
                Author::User,
                text,
                now,
            ));
            history.push(Message::new(
                MessageId::confirmed(format!("mock-{sequence}")),
                Author::Assistant,
                reply.reply_text.clone(),
                now,
            ));

            Ok(reply)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::controller::{ChatSessionController, SendOutcome};
    use crate::identity::UserResolution;
    use crate::message::SEND_FALLBACK_TEXT;
    use crate::service::ServiceError;

    #[test]
    fn canned_reply_matches_keywords_case_insensitively() {
        assert!(
            MockChatService::canned_reply("Onde posso ECONOMIZAR?").starts_with("Revise assinaturas")
        );
        assert!(
            MockChatService::canned_reply("quero investir no Tesouro")
                .contains("reserva de emergência")
        );
        assert_eq!(MockChatService::canned_reply("bom dia"), DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn sent_turns_show_up_in_next_history() {
        let service = MockChatService::new();
        let user_id = UserId::new("u-1");

        let reply = service
            .send_message(&user_id, "Como pagar menos juros no cartão?")
            .await
            .expect("mock send should succeed");
        let history = service
            .fetch_history(&user_id)
            .await
            .expect("mock history should load");

        assert_eq!(reply.reply_id.as_deref(), Some("mock-1"));
        assert!(reply.replied_at.is_some());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].author, Author::User);
        assert_eq!(history[1].text, reply.reply_text);
    }

    #[tokio::test]
    async fn controller_round_trip_against_mock() {
        let service = Arc::new(MockChatService::new());
        service
            .seed_history(
                UserId::new("u-1"),
                vec![Message::new(
                    MessageId::confirmed("seed-1"),
                    Author::Assistant,
                    "Olá! Sou seu assistente financeiro.",
                    Utc::now(),
                )],
            )
            .await;
        let (controller, _hints) = ChatSessionController::new(service.clone());

        controller.activate(UserResolution::signed_in("u-1")).await;
        assert_eq!(controller.snapshot().messages.len(), 1);

        let outcome = controller.send("Onde posso economizar?").await;
        assert!(matches!(outcome, SendOutcome::Replied(ref id) if !id.is_pending()));

        service.set_fail_send(true);
        let outcome = controller.send("E agora?").await;
        assert!(matches!(outcome, SendOutcome::Degraded(_)));

        let state = controller.snapshot();
        assert_eq!(state.messages.len(), 5);
        assert_eq!(
            state.messages.last().map(|message| message.text.as_str()),
            Some(SEND_FALLBACK_TEXT)
        );
    }

    #[tokio::test]
    async fn failing_history_is_reported_as_server_error() {
        let service = MockChatService::new();
        service.set_fail_history(true);

        let error = service
            .fetch_history(&UserId::new("u-1"))
            .await
            .expect_err("history should fail");

        assert!(matches!(error, ServiceError::Server { status: 503, .. }));
        assert_eq!(error.stage(), "mock-fetch-history");
    }
}
