//! In-memory fakes of every port, for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use parley_types::analytics::{AnalyticsError, UsageEvent};
use parley_types::chat::{Chat, ChatMessage};
use parley_types::enrich::{EnrichError, FileAttachment, Recognition};
use parley_types::error::RepositoryError;
use parley_types::llm::{
    InferenceError, InferenceRequest, InferenceResponse, ModelTarget, Usage,
};
use parley_types::model::AiModel;
use parley_types::shortcut::Shortcut;
use parley_types::user::{
    PREMIUM_PLAN, QuotaBucket, Subscription, SubscriptionKind, SubscriptionStatus, User,
};
use uuid::Uuid;

use crate::analytics::sink::AnalyticsSink;
use crate::chat::repository::ChatRepository;
use crate::enrich::{FileRecognizer, ImageRecognizer};
use crate::llm::box_gateway::BoxInferenceGateway;
use crate::llm::gateway::InferenceGateway;
use crate::llm::title::TitleGenerator;
use crate::repository::Page;
use crate::repository::model::ModelRepository;
use crate::repository::shortcut::ShortcutRepository;
use crate::repository::user::UserRepository;

// --- Fixtures ---

pub fn sample_user() -> User {
    let now = Utc::now();
    User {
        id: Uuid::now_v7(),
        external_id: Uuid::now_v7().simple().to_string(),
        display_name: "tester".to_string(),
        free_questions: 10,
        premium_questions: 0,
        default_model_id: Uuid::now_v7(),
        system_prompt: "You are helpful.".to_string(),
        subscriptions: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_model(premium: bool) -> AiModel {
    AiModel {
        id: Uuid::now_v7(),
        system_name: if premium { "gpt-4o" } else { "llama3.3-70b" }.to_string(),
        display_name: if premium { "GPT-4o" } else { "Llama 3.3" }.to_string(),
        providers: vec!["cerebras".to_string()],
        premium,
        capabilities: Vec::new(),
        created_at: Utc::now(),
    }
}

pub fn subscription(user: &User, status: SubscriptionStatus) -> Subscription {
    Subscription {
        id: Uuid::now_v7(),
        user_id: user.id,
        plan: PREMIUM_PLAN.to_string(),
        status,
        kind: SubscriptionKind::Paid,
        valid_until: Utc::now() + chrono::Duration::days(30),
        payment_reference: None,
        provider_payment_reference: None,
        created_at: Utc::now(),
    }
}

pub fn shortcut(user: &User, command: &str, instruction: &str, model_id: Option<Uuid>) -> Shortcut {
    Shortcut {
        id: Uuid::now_v7(),
        user_id: user.id,
        command: command.to_string(),
        instruction: instruction.to_string(),
        model_id,
        created_at: Utc::now(),
    }
}

pub fn usage_event(prompt: &str) -> UsageEvent {
    UsageEvent {
        user_id: Uuid::now_v7(),
        chat_id: Uuid::now_v7(),
        model: "llama3.3-70b".to_string(),
        provider: "cerebras".to_string(),
        usage: Usage::default(),
        prompt: prompt.to_string(),
        completion: "done".to_string(),
        timestamp: Utc::now(),
    }
}

pub fn text_reply(content: &str) -> InferenceResponse {
    InferenceResponse {
        content: content.to_string(),
        kind: "text".to_string(),
        usage: Usage {
            prompt_tokens: 12,
            completion_tokens: 4,
        },
        agent_usage: 0,
    }
}

pub fn title_generator(gateway: &ScriptedGateway) -> TitleGenerator {
    TitleGenerator::new(
        Arc::new(BoxInferenceGateway::new(gateway.clone())),
        ModelTarget {
            system_name: "llama3.3-70b".to_string(),
            providers: vec!["cerebras".to_string()],
        },
    )
}

// --- Repositories ---

#[derive(Clone, Default)]
pub struct InMemoryUsers {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn get(&self, id: &Uuid) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }
}

impl UserRepository for InMemoryUsers {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.external_id == user.external_id) {
            return Err(RepositoryError::Conflict(user.external_id.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_by_external_id(&self, external_id: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn update_profile(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let stored = users.get_mut(&user.id).ok_or(RepositoryError::NotFound)?;
        stored.display_name = user.display_name.clone();
        stored.system_prompt = user.system_prompt.clone();
        stored.default_model_id = user.default_model_id;
        stored.updated_at = user.updated_at;
        Ok(stored.clone())
    }

    async fn debit_balance(
        &self,
        user_id: &Uuid,
        bucket: QuotaBucket,
        cost: u32,
    ) -> Result<u32, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        let balance = match bucket {
            QuotaBucket::Free => &mut user.free_questions,
            QuotaBucket::Premium => &mut user.premium_questions,
        };
        *balance = balance.saturating_sub(cost);
        Ok(*balance)
    }

    async fn upsert_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&subscription.user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.subscriptions.retain(|s| s.plan != subscription.plan);
        user.subscriptions.push(subscription.clone());
        Ok(subscription.clone())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryModels {
    models: Arc<Mutex<Vec<AiModel>>>,
}

impl InMemoryModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, model: AiModel) {
        self.models.lock().unwrap().push(model);
    }
}

impl ModelRepository for InMemoryModels {
    async fn create(&self, model: &AiModel) -> Result<AiModel, RepositoryError> {
        let mut models = self.models.lock().unwrap();
        if models.iter().any(|m| m.system_name == model.system_name) {
            return Err(RepositoryError::Conflict(model.system_name.clone()));
        }
        models.push(model.clone());
        Ok(model.clone())
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<AiModel>, RepositoryError> {
        Ok(self.models.lock().unwrap().iter().find(|m| m.id == *id).cloned())
    }

    async fn get_by_system_name(&self, system_name: &str) -> Result<Option<AiModel>, RepositoryError> {
        Ok(self
            .models
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.system_name == system_name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<AiModel>, RepositoryError> {
        let mut models = self.models.lock().unwrap().clone();
        models.sort_by_key(|m| m.premium);
        Ok(models)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryShortcuts {
    shortcuts: Arc<Mutex<Vec<Shortcut>>>,
}

impl InMemoryShortcuts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, shortcut: Shortcut) {
        self.shortcuts.lock().unwrap().push(shortcut);
    }
}

impl ShortcutRepository for InMemoryShortcuts {
    async fn create(&self, shortcut: &Shortcut) -> Result<Shortcut, RepositoryError> {
        let mut shortcuts = self.shortcuts.lock().unwrap();
        if shortcuts
            .iter()
            .any(|s| s.user_id == shortcut.user_id && s.command == shortcut.command)
        {
            return Err(RepositoryError::Conflict(shortcut.command.clone()));
        }
        shortcuts.push(shortcut.clone());
        Ok(shortcut.clone())
    }

    async fn find_by_command(
        &self,
        user_id: &Uuid,
        command: &str,
    ) -> Result<Option<Shortcut>, RepositoryError> {
        Ok(self
            .shortcuts
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == *user_id && s.command == command)
            .cloned())
    }

    async fn get(&self, user_id: &Uuid, id: &Uuid) -> Result<Option<Shortcut>, RepositoryError> {
        Ok(self
            .shortcuts
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == *user_id && s.id == *id)
            .cloned())
    }

    async fn list(&self, user_id: &Uuid) -> Result<Vec<Shortcut>, RepositoryError> {
        let mut owned: Vec<Shortcut> = self
            .shortcuts
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == *user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.command.cmp(&b.command));
        Ok(owned)
    }

    async fn update(&self, shortcut: &Shortcut) -> Result<Shortcut, RepositoryError> {
        let mut shortcuts = self.shortcuts.lock().unwrap();
        let stored = shortcuts
            .iter_mut()
            .find(|s| s.id == shortcut.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = shortcut.clone();
        Ok(shortcut.clone())
    }

    async fn delete(&self, user_id: &Uuid, id: &Uuid) -> Result<(), RepositoryError> {
        let mut shortcuts = self.shortcuts.lock().unwrap();
        let before = shortcuts.len();
        shortcuts.retain(|s| !(s.user_id == *user_id && s.id == *id));
        if shortcuts.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
struct ChatTables {
    chats: HashMap<Uuid, Chat>,
    members: Vec<(Uuid, Uuid)>,
    messages: Vec<ChatMessage>,
}

#[derive(Clone, Default)]
pub struct InMemoryChats {
    tables: Arc<Mutex<ChatTables>>,
    fail_saves_from: Arc<Mutex<Option<usize>>>,
}

impl InMemoryChats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_count(&self) -> usize {
        self.tables.lock().unwrap().chats.len()
    }

    pub fn message_count(&self, chat_id: &Uuid) -> usize {
        self.messages(chat_id).len()
    }

    pub fn messages(&self, chat_id: &Uuid) -> Vec<ChatMessage> {
        self.tables
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.chat_id == *chat_id)
            .cloned()
            .collect()
    }

    pub fn all_messages(&self) -> Vec<ChatMessage> {
        self.tables.lock().unwrap().messages.clone()
    }

    /// Make every `save_message` call after the first `n` fail.
    pub fn fail_saves_after(&self, n: usize) {
        *self.fail_saves_from.lock().unwrap() = Some(n);
    }
}

impl ChatRepository for InMemoryChats {
    async fn create_chat(&self, chat: &Chat, owner_id: &Uuid) -> Result<Chat, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables.chats.insert(chat.id, chat.clone());
        tables.members.push((chat.id, *owner_id));
        Ok(chat.clone())
    }

    async fn get_chat(&self, user_id: &Uuid, chat_id: &Uuid) -> Result<Option<Chat>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        if !tables.members.contains(&(*chat_id, *user_id)) {
            return Ok(None);
        }
        Ok(tables.chats.get(chat_id).cloned())
    }

    async fn list_chats(&self, user_id: &Uuid, page: Page) -> Result<Vec<Chat>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let mut chats: Vec<Chat> = tables
            .members
            .iter()
            .filter(|(_, member)| member == user_id)
            .filter_map(|(chat_id, _)| tables.chats.get(chat_id).cloned())
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn update_title(&self, chat_id: &Uuid, title: &str) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let chat = tables.chats.get_mut(chat_id).ok_or(RepositoryError::NotFound)?;
        chat.title = title.to_string();
        chat.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &Uuid) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables.messages.retain(|m| m.chat_id != *chat_id);
        tables.members.retain(|(c, _)| c != chat_id);
        tables.chats.remove(chat_id);
        Ok(())
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(limit) = *self.fail_saves_from.lock().unwrap() {
            if tables.messages.len() >= limit {
                return Err(RepositoryError::Connection);
            }
        }
        tables.messages.push(message.clone());
        Ok(())
    }

    async fn get_messages(&self, chat_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        Ok(self.messages(chat_id))
    }
}

// --- Remote collaborators ---

/// Gateway that replays queued replies and records every request.
///
/// With an empty queue it answers "Hi there!".
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    replies: Arc<Mutex<VecDeque<Result<InferenceResponse, InferenceError>>>>,
    calls: Arc<Mutex<Vec<InferenceRequest>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, content: &str) {
        self.push_response(text_reply(content));
    }

    pub fn push_response(&self, response: InferenceResponse) {
        self.replies.lock().unwrap().push_back(Ok(response));
    }

    pub fn push_error(&self, error: InferenceError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<InferenceRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl InferenceGateway for ScriptedGateway {
    async fn infer(&self, request: &InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        self.calls.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(text_reply("Hi there!")))
    }
}

#[derive(Clone)]
pub struct FakeImageRecognizer {
    text: String,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FakeImageRecognizer {
    pub fn ok(text: &str) -> Self {
        Self {
            text: text.to_string(),
            delay: None,
            calls: Arc::default(),
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::ok("late")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageRecognizer for FakeImageRecognizer {
    async fn recognize_image(&self, _image_base64: &str) -> Result<String, EnrichError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.text.clone())
    }
}

#[derive(Clone)]
pub struct FakeFileRecognizer {
    result: Option<Recognition>,
    calls: Arc<AtomicUsize>,
}

impl FakeFileRecognizer {
    pub fn ok(recognition: Recognition) -> Self {
        Self {
            result: Some(recognition),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            calls: Arc::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FileRecognizer for FakeFileRecognizer {
    async fn recognize_file(&self, _file: &FileAttachment) -> Result<Recognition, EnrichError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().ok_or(EnrichError::Status {
            service: "file recognition",
            status: 500,
        })
    }
}

/// Sink that records delivered events, optionally failing the first few.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<UsageEvent>>>,
    failures_left: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(n: usize) -> Self {
        Self {
            events: Arc::default(),
            failures_left: Arc::new(AtomicUsize::new(n)),
        }
    }

    pub fn events(&self) -> Vec<UsageEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AnalyticsSink for RecordingSink {
    async fn capture(&self, event: &UsageEvent) -> Result<(), AnalyticsError> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(AnalyticsError::Status(503));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
