use leptos::prelude::*;
use leptos::task::spawn_local;

use tutor_chat::errors::ChatError;
use tutor_chat::flashcards::Deck;
use tutor_chat::models::{Feedback, Flashcard};
use tutor_chat::protocol::Frame;
use tutor_chat::service::{SendPipeline, TurnSink};
use tutor_chat::state::ChatStore;
use tutor_chat::viewport::ViewportController;

use crate::api::{self, FetchTransport};

/// Which flashcards the drawer shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawerScope {
    Chat,
    Message(String),
}

/// Shared application state, provided via Leptos context.
#[derive(Clone, Copy)]
pub struct AppState {
    // --- Read signals ---
    pub store: ReadSignal<ChatStore>,
    pub viewport: ReadSignal<ViewportController>,
    pub deck: ReadSignal<Deck>,
    pub drawer: ReadSignal<Option<DrawerScope>>,

    // --- Write signals ---
    pub set_store: WriteSignal<ChatStore>,
    pub set_viewport: WriteSignal<ViewportController>,
    pub set_deck: WriteSignal<Deck>,
    pub set_drawer: WriteSignal<Option<DrawerScope>>,
}

/// Feeds one turn into the store signal. Writes after the app is torn down
/// are dropped, and the stream stops once the turn is abandoned.
struct SignalSink {
    store: ReadSignal<ChatStore>,
    set_store: WriteSignal<ChatStore>,
    assistant_id: String,
}

impl TurnSink for SignalSink {
    fn on_frame(&mut self, frame: Frame) {
        let id = &self.assistant_id;
        self.set_store.try_update(|store| {
            store.apply(id, frame);
        });
    }

    fn on_complete(&mut self) {
        let id = &self.assistant_id;
        self.set_store.try_update(|store| store.finish(id));
    }

    fn on_error(&mut self, error: &ChatError) {
        let id = &self.assistant_id;
        self.set_store.try_update(|store| store.fail(id, error));
    }

    fn is_open(&self) -> bool {
        self.store
            .try_with_untracked(|store| store.owns_turn(&self.assistant_id))
            .unwrap_or(false)
    }
}

impl AppState {
    /// Create a new `AppState` and provide it in the current Leptos context.
    pub fn provide() -> Self {
        let (store, set_store) = signal(ChatStore::new(&api::client_config()));
        let (viewport, set_viewport) = signal(ViewportController::new());
        let (deck, set_deck) = signal(Deck::default());
        let (drawer, set_drawer) = signal(None::<DrawerScope>);

        let state = Self {
            store,
            viewport,
            deck,
            drawer,
            set_store,
            set_viewport,
            set_deck,
            set_drawer,
        };

        provide_context(state);
        state
    }

    /// Submit `text` and stream the reply into the store. Returns whether the
    /// message was accepted.
    pub fn send_message(&self, text: String) -> bool {
        let submitted = self.set_store.try_update(|store| {
            let result = store.submit(&text);
            if let Err(e) = &result {
                store.show_error(e);
            }
            result
        });
        let Some(Ok(ticket)) = submitted else {
            return false;
        };
        self.set_viewport.update(|vp| {
            vp.on_submit();
        });
        log::debug!("Sending turn for chat {}", ticket.chat_id);

        let mut sink = SignalSink {
            store: self.store,
            set_store: self.set_store,
            assistant_id: ticket.assistant_id.clone(),
        };
        spawn_local(async move {
            let config = api::client_config();
            let pipeline = SendPipeline::new(FetchTransport::new(config.api_url.clone()), config);
            if let Err(e) = pipeline.drive(&ticket.history, &mut sink).await {
                log::error!("Turn failed: {e}");
            }
        });
        true
    }

    pub fn new_chat(&self) {
        self.set_store.update(|store| {
            store.new_chat();
        });
        self.set_drawer.set(None);
    }

    pub fn select_chat(&self, id: String) {
        self.set_store.update(|store| {
            if let Err(e) = store.select_chat(&id) {
                store.show_error(&e);
            }
        });
        self.set_drawer.set(None);
    }

    pub fn delete_chat(&self, id: String) {
        self.set_store.update(|store| {
            if let Err(e) = store.delete_chat(&id) {
                store.show_error(&e);
            }
        });
        self.set_drawer.set(None);
    }

    pub fn set_feedback(&self, message_id: String, feedback: Feedback) {
        self.set_store.update(|store| {
            if let Err(e) = store.set_feedback(&message_id, feedback) {
                log::warn!("Feedback not recorded: {e}");
            }
        });
    }

    pub fn open_drawer(&self, scope: DrawerScope) {
        self.set_deck.update(|deck| deck.jump_to(0, 0));
        self.set_drawer.set(Some(scope));
    }

    pub fn close_drawer(&self) {
        self.set_drawer.set(None);
    }

    /// Cards in the drawer's current scope, oldest first.
    pub fn drawer_cards(&self) -> Vec<Flashcard> {
        let Some(scope) = self.drawer.get() else {
            return Vec::new();
        };
        self.store.with(|store| {
            let Some(chat) = store.current_chat() else {
                return Vec::new();
            };
            match scope {
                DrawerScope::Chat => chat.flashcards().to_vec(),
                DrawerScope::Message(id) => chat.flashcards_for(&id).into_iter().cloned().collect(),
            }
        })
    }
}
