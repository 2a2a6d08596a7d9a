use chrono::Utc;
use leptos::ev;
use leptos::prelude::*;

use crate::state::AppState;

/// Sidebar showing the chat list and "New Chat" button.
#[component]
pub fn Sidebar() -> impl IntoView {
    let state = expect_context::<AppState>();
    let summaries = Memo::new(move |_| state.store.with(|s| s.summaries(Utc::now())));

    view! {
        <aside class="sidebar">
            <div class="sidebar-header">
                <h2>"Science Tutor"</h2>
                <button class="new-chat-btn" on:click=move |_| state.new_chat()>
                    "+ New Chat"
                </button>
            </div>
            <div class="conversation-list">
                {move || {
                    if summaries.with(Vec::is_empty) {
                        view! {
                            <div style="padding:1rem;color:var(--text-secondary);font-size:0.85rem">
                                "No chats yet"
                            </div>
                        }.into_any()
                    } else {
                        view! {
                            <For
                                each=move || summaries.get()
                                key=|c| (c.id.clone(), c.title.clone(), c.message_count, c.day_label.clone())
                                let:chat
                            >
                                {
                                    let select_id = chat.id.clone();
                                    let delete_id = chat.id.clone();
                                    let active_id = chat.id.clone();
                                    let meta = format!("{} · {} messages", chat.day_label, chat.message_count);
                                    view! {
                                        <div
                                            class="conversation-item"
                                            class:active=move || {
                                                state.store.with(|s| s.current_id() == Some(active_id.as_str()))
                                            }
                                            on:click=move |_| state.select_chat(select_id.clone())
                                        >
                                            <div class="conversation-title">{chat.title}</div>
                                            <div class="conversation-meta">{meta}</div>
                                            <button
                                                class="delete-btn"
                                                title="Delete chat"
                                                on:click=move |ev: ev::MouseEvent| {
                                                    ev.stop_propagation();
                                                    state.delete_chat(delete_id.clone());
                                                }
                                            >
                                                "×"
                                            </button>
                                        </div>
                                    }
                                }
                            </For>
                        }.into_any()
                    }
                }}
            </div>
        </aside>
    }
}
