use leptos::ev;
use leptos::prelude::*;

use tutor_chat::flashcards::{Deck, ViewMode};
use tutor_chat::models::Flashcard;

use crate::state::{AppState, DrawerScope};

/// Slide-over panel for studying flashcards. Escape closes it, arrow keys
/// move between cards.
#[component]
pub fn FlashcardDrawer() -> impl IntoView {
    let state = expect_context::<AppState>();
    let cards = Memo::new(move |_| state.drawer_cards());

    // Keep the position valid when cards disappear (chat switched or deleted)
    Effect::new(move |_| {
        let len = cards.with(Vec::len);
        state.set_deck.update(|deck| deck.clamp(len));
    });

    let handle = window_event_listener(ev::keydown, move |ev| {
        if state.drawer.get_untracked().is_none() {
            return;
        }
        let len = cards.with_untracked(Vec::len);
        match ev.key().as_str() {
            "Escape" => state.close_drawer(),
            "ArrowRight" => state.set_deck.update(|deck| deck.next(len)),
            "ArrowLeft" => state.set_deck.update(|deck| deck.prev(len)),
            _ => {}
        }
    });
    on_cleanup(move || handle.remove());

    move || {
        state.drawer.get().map(|scope| {
            let title = match scope {
                DrawerScope::Chat => "Flashcards in this chat",
                DrawerScope::Message(_) => "Flashcards from this reply",
            };
            view! {
                <div class="drawer-backdrop" on:click=move |_| state.close_drawer()></div>
                <aside class="flashcard-drawer" role="dialog">
                    <div class="drawer-header">
                        <h2>{title}</h2>
                        <div class="view-modes">
                            {ViewMode::ALL
                                .into_iter()
                                .map(|mode| {
                                    view! {
                                        <button
                                            class="mode-btn"
                                            class:active=move || state.deck.with(|d| d.view_mode == mode)
                                            on:click=move |_| state.set_deck.update(|d| d.set_mode(mode))
                                        >
                                            {mode.label()}
                                        </button>
                                    }
                                })
                                .collect_view()}
                        </div>
                        <button class="close-btn" title="Close (Esc)" on:click=move |_| state.close_drawer()>
                            "×"
                        </button>
                    </div>
                    <div class="drawer-body">
                        {move || {
                            let cards = cards.get();
                            if cards.is_empty() {
                                return view! { <div class="empty-state">"No flashcards yet"</div> }.into_any();
                            }
                            match state.deck.with(|d| d.view_mode) {
                                ViewMode::Single => view! { <SingleCard cards=cards /> }.into_any(),
                                ViewMode::Carousel => view! { <Carousel cards=cards /> }.into_any(),
                                ViewMode::Grid => view! { <Grid cards=cards /> }.into_any(),
                            }
                        }}
                    </div>
                </aside>
            }
        })
    }
}

/// One card at a time with flip and prev/next.
#[component]
fn SingleCard(cards: Vec<Flashcard>) -> impl IntoView {
    let state = expect_context::<AppState>();
    let len = cards.len();

    move || {
        let deck = state.deck.get();
        let card = cards.get(deck.current_index).cloned()?;
        Some(view! {
            <div class="flashcard single">
                <span class="subject-badge">{card.subject.as_str()}</span>
                <div class="question">{card.question}</div>
                {deck.show_answer.then(|| view! { <div class="answer">{card.answer}</div> })}
                <button class="flip-btn" on:click=move |_| state.set_deck.update(Deck::flip)>
                    {if deck.show_answer { "Hide answer" } else { "Show answer" }}
                </button>
            </div>
            <div class="deck-nav">
                <button on:click=move |_| state.set_deck.update(|d| d.prev(len))>"‹ Prev"</button>
                <span>{format!("{} / {len}", deck.current_index + 1)}</span>
                <button on:click=move |_| state.set_deck.update(|d| d.next(len))>"Next ›"</button>
            </div>
        })
    }
}

/// A scrolling strip; clicking the current card flips it, any other card
/// becomes current.
#[component]
fn Carousel(cards: Vec<Flashcard>) -> impl IntoView {
    let state = expect_context::<AppState>();
    let len = cards.len();

    view! {
        <div class="carousel">
            <button class="nav-btn" on:click=move |_| state.set_deck.update(|d| d.prev(len))>"‹"</button>
            <div class="carousel-track">
                {cards
                    .into_iter()
                    .enumerate()
                    .map(|(i, card)| {
                        let is_current = move || state.deck.with(|d| d.current_index == i);
                        let answer_hidden = move || !(is_current() && state.deck.with(|d| d.show_answer));
                        view! {
                            <div
                                class="flashcard"
                                class:current=is_current
                                on:click=move |_| {
                                    state.set_deck.update(|d| {
                                        if d.current_index == i { d.flip() } else { d.jump_to(i, len) }
                                    })
                                }
                            >
                                <span class="subject-badge">{card.subject.as_str()}</span>
                                <div class="question">{card.question}</div>
                                <div class="answer" class:hidden=answer_hidden>{card.answer}</div>
                            </div>
                        }
                    })
                    .collect_view()}
            </div>
            <button class="nav-btn" on:click=move |_| state.set_deck.update(|d| d.next(len))>"›"</button>
        </div>
    }
}

#[component]
fn Grid(cards: Vec<Flashcard>) -> impl IntoView {
    view! {
        <div class="flashcard-grid">
            {cards
                .into_iter()
                .map(|card| {
                    view! {
                        <div class="flashcard">
                            <span class="subject-badge">{card.subject.as_str()}</span>
                            <div class="question">{card.question}</div>
                            <div class="answer">{card.answer}</div>
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}
