//! Conversation store.
//!
//! Maps conversation identifiers to their contexts. Each context sits behind
//! its own async mutex so a caller can hold it across a backend call, which
//! serializes turns within a conversation while leaving other conversations
//! free to proceed. The map lock itself is only held for lookups and is
//! never awaited while a context lock is being acquired.

use crate::context::ConversationContext;
use parley_core::ConversationId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

/// Handle to a stored context.
pub type SharedContext = Arc<Mutex<ConversationContext>>;

/// In-memory store of conversation contexts.
#[derive(Debug, Default)]
pub struct ConversationStore {
    contexts: Mutex<HashMap<ConversationId, SharedContext>>,
}

impl ConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context for `id`, creating an empty one if needed.
    ///
    /// The variant follows the identifier's kind.
    pub async fn get_or_create(&self, id: &ConversationId) -> SharedContext {
        let mut contexts = self.contexts.lock().await;
        if let Some(context) = contexts.get(id) {
            return Arc::clone(context);
        }

        debug!(conversation = %id, "creating conversation context");
        let context = Arc::new(Mutex::new(ConversationContext::new(id.is_group())));
        contexts.insert(id.clone(), Arc::clone(&context));
        context
    }

    /// Locks the live context for `id`, creating it if needed.
    ///
    /// If the context is reset while waiting for the lock, the wait starts
    /// over on the replacement, so the returned guard always belongs to the
    /// context currently stored under `id`.
    pub async fn lock(&self, id: &ConversationId) -> OwnedMutexGuard<ConversationContext> {
        loop {
            let context = self.get_or_create(id).await;
            let guard = Arc::clone(&context).lock_owned().await;
            if self.is_current(id, &context).await {
                return guard;
            }
            debug!(conversation = %id, "context was reset while waiting, retrying");
        }
    }

    /// Returns the context for `id` if one exists.
    pub async fn get(&self, id: &ConversationId) -> Option<SharedContext> {
        self.contexts.lock().await.get(id).cloned()
    }

    /// Discards the context for `id`.
    ///
    /// Waits for any turn holding the context to finish first. Returns
    /// whether a context was removed; resetting an unknown conversation is
    /// not an error.
    pub async fn reset(&self, id: &ConversationId) -> bool {
        let Some(context) = self.get(id).await else {
            info!(conversation = %id, removed = false, "conversation reset");
            return false;
        };

        let _guard = context.lock().await;
        let mut contexts = self.contexts.lock().await;
        let removed = contexts
            .get(id)
            .is_some_and(|stored| Arc::ptr_eq(stored, &context));
        if removed {
            contexts.remove(id);
        }
        info!(conversation = %id, removed, "conversation reset");
        removed
    }

    async fn is_current(&self, id: &ConversationId, context: &SharedContext) -> bool {
        self.contexts
            .lock()
            .await
            .get(id)
            .is_some_and(|stored| Arc::ptr_eq(stored, context))
    }
}
