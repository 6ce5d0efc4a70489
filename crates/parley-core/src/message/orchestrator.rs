//! The message pipeline.
//!
//! One inbound message runs through, strictly in order:
//! resolve user, resolve command, resolve model and check quota, enrich
//! context, resolve chat, persist the user message, infer, persist the
//! reply, debit quota, emit analytics, respond.
//!
//! Nothing is cached across runs and nothing is retried. Failures before
//! the debit leave balances untouched; a user message persisted before a
//! failed inference is kept.

use std::sync::Arc;

use chrono::Utc;
use parley_types::analytics::UsageEvent;
use parley_types::chat::MessageRole;
use parley_types::error::ServiceError;
use parley_types::llm::{InferenceRequest, ModelTarget, Turn};
use parley_types::pipeline::{MessageReply, MessageRequest};
use tracing::{Span, error, info};

use crate::analytics::dispatcher::AnalyticsDispatcher;
use crate::chat::repository::ChatRepository;
use crate::chat::service::ConversationStore;
use crate::enrich::context::ContextEnricher;
use crate::llm::box_gateway::BoxInferenceGateway;
use crate::quota::ledger::{QuotaLedger, check_eligibility};
use crate::repository::model::ModelRepository;
use crate::repository::shortcut::ShortcutRepository;
use crate::repository::user::UserRepository;
use crate::shortcut::resolver::ShortcutResolver;

/// Pipeline step, recorded on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveUser,
    ResolveCommand,
    ResolveModel,
    CheckQuota,
    EnrichContext,
    ResolveChat,
    PersistUserMessage,
    Infer,
    PersistAssistantMessage,
    DebitQuota,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ResolveUser => "resolve_user",
            Stage::ResolveCommand => "resolve_command",
            Stage::ResolveModel => "resolve_model",
            Stage::CheckQuota => "check_quota",
            Stage::EnrichContext => "enrich_context",
            Stage::ResolveChat => "resolve_chat",
            Stage::PersistUserMessage => "persist_user_message",
            Stage::Infer => "infer",
            Stage::PersistAssistantMessage => "persist_assistant_message",
            Stage::DebitQuota => "debit_quota",
        }
    }
}

struct Failure {
    stage: Stage,
    error: ServiceError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, Failure>;
}

impl<T, E: Into<ServiceError>> AtStage<T> for Result<T, E> {
    fn at(self, stage: Stage) -> Result<T, Failure> {
        self.map_err(|e| Failure {
            stage,
            error: e.into(),
        })
    }
}

/// Composes the ledger, resolver, enrichers, conversation store, gateway
/// and analytics into one pipeline per message.
pub struct MessageOrchestrator<U, M, S, C>
where
    U: UserRepository,
    M: ModelRepository,
    S: ShortcutRepository,
    C: ChatRepository,
{
    ledger: QuotaLedger<U>,
    models: M,
    resolver: ShortcutResolver<S>,
    enricher: ContextEnricher,
    conversations: ConversationStore<C>,
    gateway: Arc<BoxInferenceGateway>,
    analytics: AnalyticsDispatcher,
}

impl<U, M, S, C> MessageOrchestrator<U, M, S, C>
where
    U: UserRepository,
    M: ModelRepository,
    S: ShortcutRepository,
    C: ChatRepository,
{
    pub fn new(
        ledger: QuotaLedger<U>,
        models: M,
        resolver: ShortcutResolver<S>,
        enricher: ContextEnricher,
        conversations: ConversationStore<C>,
        gateway: Arc<BoxInferenceGateway>,
        analytics: AnalyticsDispatcher,
    ) -> Self {
        Self {
            ledger,
            models,
            resolver,
            enricher,
            conversations,
            gateway,
            analytics,
        }
    }

    /// Access the conversation store (shared with the chat endpoints).
    pub fn conversations(&self) -> &ConversationStore<C> {
        &self.conversations
    }

    /// Run the pipeline for one message.
    ///
    /// Client-facing failures are returned as-is. Upstream and internal
    /// failures are logged here with the failing stage; callers must not
    /// show their message to end users.
    #[tracing::instrument(
        name = "handle_message",
        skip_all,
        fields(external_id = %request.external_id, chat_id = tracing::field::Empty)
    )]
    pub async fn handle(&self, request: MessageRequest) -> Result<MessageReply, ServiceError> {
        match self.run(request).await {
            Ok(reply) => Ok(reply),
            Err(Failure { stage, error }) => {
                if error.is_client_error() {
                    info!(stage = stage.as_str(), kind = error.kind().as_str(), error = %error, "message rejected");
                } else {
                    error!(stage = stage.as_str(), kind = error.kind().as_str(), error = %error, "message pipeline failed");
                }
                Err(error)
            }
        }
    }

    async fn run(&self, request: MessageRequest) -> Result<MessageReply, Failure> {
        let user = self
            .ledger
            .find_account(&request.external_id)
            .await
            .at(Stage::ResolveUser)?;

        let command = self
            .resolver
            .resolve(&user, &request.prompt)
            .await
            .at(Stage::ResolveCommand)?;

        let model = self
            .models
            .get_by_id(&command.model_id)
            .await
            .at(Stage::ResolveModel)?
            .ok_or_else(|| ServiceError::not_found("model not found"))
            .at(Stage::ResolveModel)?;
        check_eligibility(&user, &model).at(Stage::CheckQuota)?;

        let mut questions_cost: u32 = 0;
        let enrichment = self
            .enricher
            .enrich(request.image.as_deref(), request.file.as_ref())
            .await
            .at(Stage::EnrichContext)?;
        if !model.premium {
            questions_cost += enrichment.count();
        }
        let prompt = enrichment.compose(&command.prompt);

        let resolved = self
            .conversations
            .resolve_or_create_chat(user.id, request.chat, &prompt)
            .await
            .at(Stage::ResolveChat)?;
        let chat_id = resolved.chat.id;
        Span::current().record("chat_id", tracing::field::display(chat_id));

        let user_message = self
            .conversations
            .append_message(chat_id, user.id, MessageRole::User, prompt.clone(), None)
            .await
            .at(Stage::PersistUserMessage)?;

        let mut conversation = Vec::with_capacity(resolved.history.len() + 2);
        conversation.push(Turn::system(user.system_prompt.clone()));
        conversation.extend(resolved.history);
        conversation.push(Turn::user(prompt.clone()));

        let inference = InferenceRequest {
            conversation,
            model: ModelTarget {
                system_name: model.system_name.clone(),
                providers: model.providers.clone(),
            },
            agent_mode: user.has_premium_subscription(),
            caller: user.id.to_string(),
        };
        let response = self.gateway.infer(&inference).await.at(Stage::Infer)?;
        questions_cost += 1;
        if response.agent_usage > 0 {
            questions_cost += 1;
        }

        if response.is_image() {
            info!(chat_id = %chat_id, "image reply not stored as history");
        } else {
            self.conversations
                .append_message(
                    chat_id,
                    user.id,
                    MessageRole::Assistant,
                    response.content.clone(),
                    Some(user_message.id),
                )
                .await
                .at(Stage::PersistAssistantMessage)?;
        }

        self.ledger
            .debit(&user, &model, questions_cost)
            .await
            .at(Stage::DebitQuota)?;

        self.analytics.dispatch(UsageEvent {
            user_id: user.id,
            chat_id,
            model: model.system_name.clone(),
            provider: model.providers.first().cloned().unwrap_or_default(),
            usage: response.usage,
            prompt,
            completion: response.content.clone(),
            timestamp: Utc::now(),
        });

        if resolved.created {
            info!(chat_id = %chat_id, title = %resolved.chat.title, "conversation started");
        }
        Ok(MessageReply {
            content: response.content,
            kind: response.kind,
            chat_id,
        })
    }
}
