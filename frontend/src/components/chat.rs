use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;

use tutor_chat::models::{Feedback, MessageRole};
use tutor_chat::state::{ChatStore, UNTITLED_CHAT};
use tutor_chat::viewport::{ScrollAction, ScrollMetrics};

use crate::api;
use crate::state::{AppState, DrawerScope};

const NOTIFICATION_TTL_MS: u32 = 3_000;
/// Quiet period after the last scroll event before scrolling counts as over.
const SCROLL_END_MS: u32 = 150;

/// Rendered size of the current chat: message count and total text length.
fn content_size(store: &ChatStore) -> (usize, usize) {
    let messages = store.current_messages();
    (messages.len(), messages.iter().map(|m| m.content.len()).sum())
}

/// Main chat area with message history, streaming display, and input.
#[component]
pub fn ChatArea() -> impl IntoView {
    let state = expect_context::<AppState>();
    let list_ref = NodeRef::<html::Div>::new();
    let pending_scroll = StoredValue::new_local(None::<Timeout>);
    let scroll_end = StoredValue::new_local(None::<Timeout>);

    let scroll_to_bottom = move || {
        if let Some(el) = list_ref.get_untracked() {
            el.set_scroll_top(el.scroll_height());
        }
    };
    let perform = move |action: ScrollAction| {
        let ScrollAction::ScrollToBottom { delay } = action else {
            return;
        };
        if delay.is_zero() {
            pending_scroll.set_value(None);
            scroll_to_bottom();
        } else {
            // Replacing the handle cancels any scroll still waiting.
            let timeout = Timeout::new(delay.as_millis() as u32, scroll_to_bottom);
            pending_scroll.set_value(Some(timeout));
        }
    };

    // Follow new content
    Effect::new(move |_| {
        let (count, len) = state.store.with(content_size);
        let action = state
            .set_viewport
            .try_update(|vp| vp.on_content_change(count, len))
            .unwrap_or(ScrollAction::None);
        perform(action);
    });

    // Start at the bottom of a newly selected chat
    Effect::new(move |prev: Option<Option<String>>| {
        let current = state.store.with(|s| s.current_id().map(str::to_string));
        if prev.is_some_and(|prev| prev != current) {
            let (count, len) = state.store.with_untracked(content_size);
            let action = state
                .set_viewport
                .try_update(|vp| vp.reset(count, len))
                .unwrap_or(ScrollAction::None);
            perform(action);
        }
        current
    });

    let on_scroll = move |_: ev::Event| {
        let Some(el) = list_ref.get_untracked() else {
            return;
        };
        let metrics = ScrollMetrics {
            scroll_top: f64::from(el.scroll_top()),
            scroll_height: f64::from(el.scroll_height()),
            client_height: f64::from(el.client_height()),
        };
        state.set_viewport.update(|vp| vp.on_scroll(metrics));

        let set_viewport = state.set_viewport;
        let timeout = Timeout::new(SCROLL_END_MS, move || {
            set_viewport.try_update(|vp| vp.on_scroll_end());
        });
        scroll_end.set_value(Some(timeout));
    };

    let on_jump = move |_| {
        let action = state
            .set_viewport
            .try_update(|vp| vp.jump_to_bottom())
            .unwrap_or(ScrollAction::None);
        perform(action);
    };

    let has_new = move || state.viewport.with(|vp| vp.has_new_content());
    let card_count = move || {
        state
            .store
            .with(|s| s.current_chat().map_or(0, |c| c.flashcards().len()))
    };

    view! {
        <main class="chat-area">
            <ErrorBanner />

            // Chat header
            <div class="chat-header">
                <span class="chat-title">
                    {move || {
                        state.store.with(|s| {
                            s.current_chat()
                                .map(|c| c.title.clone())
                                .unwrap_or_else(|| UNTITLED_CHAT.to_string())
                        })
                    }}
                </span>
                {move || {
                    let count = card_count();
                    (count > 0).then(|| {
                        view! {
                            <button
                                class="cards-btn"
                                on:click=move |_| state.open_drawer(DrawerScope::Chat)
                            >
                                {format!("Flashcards ({count})")}
                            </button>
                        }
                    })
                }}
            </div>

            // Messages
            <div class="messages-container" node_ref=list_ref on:scroll=on_scroll>
                {move || {
                    if state.store.with(|s| s.current_messages().is_empty()) {
                        view! {
                            <div class="empty-state">
                                "Ask about physics, chemistry or biology, or ask for flashcards"
                            </div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || {
                                    state.store.with(|s| {
                                        s.current_messages()
                                            .iter()
                                            .map(|m| m.id.clone())
                                            .collect::<Vec<_>>()
                                    })
                                }
                                key=|id| id.clone()
                                let:id
                            >
                                <MessageBubble id=id />
                            </For>
                        }.into_any()
                    }
                }}
            </div>

            {move || {
                let away = state.viewport.with(|vp| !vp.at_bottom() || vp.has_new_content());
                away.then(|| {
                    view! {
                        <button class="jump-btn" class:has-new=has_new on:click=on_jump>
                            {move || if has_new() { "New messages ↓" } else { "↓" }}
                        </button>
                    }
                })
            }}

            <Toast />
            <ChatInput />
        </main>
    }
}

/// A single chat message bubble. Content is read live so streamed text shows
/// as it arrives.
#[component]
fn MessageBubble(id: String) -> impl IntoView {
    let state = expect_context::<AppState>();
    let role = state.store.with_untracked(|s| {
        s.current_chat()
            .and_then(|c| c.message(&id))
            .map(|m| m.role)
            .unwrap_or(MessageRole::Assistant)
    });
    let is_active = {
        let id = id.clone();
        Memo::new(move |_| state.store.with(|s| s.active_message_id() == Some(id.as_str())))
    };
    let content = {
        let id = id.clone();
        move || {
            state.store.with(|s| {
                s.current_chat()
                    .and_then(|c| c.message(&id))
                    .map(|m| m.content.clone())
                    .unwrap_or_default()
            })
        }
    };

    let css_class = match role {
        MessageRole::User => "message user",
        MessageRole::Assistant => "message assistant",
    };

    view! {
        <div class=css_class class:streaming=move || is_active.get()>
            <div class="role-label">{role.as_str()}</div>
            <div class="content">
                {move || {
                    let text = content();
                    if text.is_empty() && is_active.get() {
                        view! {
                            <span class="typing">
                                <span class="dot"></span>
                                <span class="dot"></span>
                                <span class="dot"></span>
                            </span>
                        }.into_any()
                    } else {
                        view! { <span>{text}</span> }.into_any()
                    }
                }}
            </div>
            {(role == MessageRole::Assistant).then(|| view! { <MessageActions id=id is_active=is_active /> })}
        </div>
    }
}

/// Feedback and flashcard buttons, hidden while the reply is streaming.
#[component]
fn MessageActions(id: String, is_active: Memo<bool>) -> impl IntoView {
    let state = expect_context::<AppState>();
    let feedback = {
        let id = id.clone();
        Memo::new(move |_| {
            state.store.with(|s| {
                s.current_chat()
                    .and_then(|c| c.message(&id))
                    .and_then(|m| m.feedback)
            })
        })
    };
    let card_count = {
        let id = id.clone();
        Memo::new(move |_| {
            state
                .store
                .with(|s| s.current_chat().map_or(0, |c| c.flashcards_for(&id).len()))
        })
    };

    move || {
        if is_active.get() {
            return None;
        }
        let (like_id, dislike_id, cards_id) = (id.clone(), id.clone(), id.clone());
        Some(view! {
            <div class="message-actions">
                <button
                    class="feedback-btn"
                    class:selected=move || feedback.get() == Some(Feedback::Liked)
                    title="Helpful"
                    on:click=move |_| state.set_feedback(like_id.clone(), Feedback::Liked)
                >
                    "👍"
                </button>
                <button
                    class="feedback-btn"
                    class:selected=move || feedback.get() == Some(Feedback::Disliked)
                    title="Not helpful"
                    on:click=move |_| state.set_feedback(dislike_id.clone(), Feedback::Disliked)
                >
                    "👎"
                </button>
                {move || {
                    let count = card_count.get();
                    let cards_id = cards_id.clone();
                    (count > 0).then(move || {
                        view! {
                            <button
                                class="cards-btn"
                                on:click=move |_| state.open_drawer(DrawerScope::Message(cards_id.clone()))
                            >
                                {format!("View {count} flashcard{}", if count == 1 { "" } else { "s" })}
                            </button>
                        }
                    })
                }}
            </div>
        })
    }
}

#[component]
fn ErrorBanner() -> impl IntoView {
    let state = expect_context::<AppState>();

    move || {
        state.store.with(|s| s.error().map(str::to_string)).map(|err| {
            view! {
                <div class="error-banner" role="alert">
                    <span>{err}</span>
                    <button
                        class="dismiss-btn"
                        title="Dismiss"
                        on:click=move |_| state.set_store.update(ChatStore::dismiss_error)
                    >
                        "×"
                    </button>
                </div>
            }
        })
    }
}

/// Transient notification, dismissed on click or after a few seconds.
#[component]
fn Toast() -> impl IntoView {
    let state = expect_context::<AppState>();
    let notification_id = Memo::new(move |_| state.store.with(|s| s.notification().map(|n| n.id)));

    Effect::new(move |_| {
        if let Some(id) = notification_id.get() {
            let set_store = state.set_store;
            spawn_local(async move {
                TimeoutFuture::new(NOTIFICATION_TTL_MS).await;
                set_store.try_update(|s| s.dismiss_notification(id));
            });
        }
    });

    move || {
        state.store.with(|s| s.notification().cloned()).map(|notification| {
            let id = notification.id;
            view! {
                <div
                    class="toast"
                    on:click=move |_| state.set_store.update(|s| s.dismiss_notification(id))
                >
                    {notification.text}
                </div>
            }
        })
    }
}

/// Chat input form with textarea and send button.
#[component]
fn ChatInput() -> impl IntoView {
    let state = expect_context::<AppState>();
    let (input, set_input) = signal(String::new());
    let max_len = api::client_config().max_message_length;

    let is_sending = move || state.store.with(ChatStore::is_busy);
    let length = move || input.with(|text| text.trim().chars().count());
    let too_long = move || length() > max_len;

    let send = move || {
        let text = input.get_untracked();
        if text.trim().is_empty() || is_sending() {
            return;
        }
        if state.send_message(text) {
            set_input.set(String::new());
        }
    };

    let send_clone = send.clone();
    let on_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" && !ev.shift_key() {
            ev.prevent_default();
            send_clone();
        }
    };

    let on_submit = move |_| {
        send();
    };

    view! {
        <div class="input-area">
            <div class="input-row">
                <textarea
                    rows="1"
                    placeholder="Ask a question… (Enter to send, Shift+Enter for newline)"
                    prop:value=input
                    on:input=move |ev| {
                        set_input.set(event_target_value(&ev));
                    }
                    on:keydown=on_keydown
                    disabled=is_sending
                />
                <button
                    class="send-btn"
                    on:click=on_submit
                    disabled=move || is_sending() || length() == 0 || too_long()
                >
                    {move || if is_sending() { "Sending…" } else { "Send" }}
                </button>
            </div>
            <div class="char-count" class:over=too_long>
                {move || format!("{} / {max_len}", length())}
            </div>
        </div>
    }
}
