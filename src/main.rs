use std::io::Write;

use chrono::Utc;
use clap::builder::RangedU64ValueParser;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use tutor_chat::config::{
    ClientConfig, DEFAULT_API_URL, DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_MESSAGE_LENGTH,
};
use tutor_chat::errors::ChatError;
use tutor_chat::models::{Feedback, MessageRole};
use tutor_chat::protocol::Frame;
use tutor_chat::service::{ReqwestTransport, SendPipeline, TurnSink};
use tutor_chat::state::{Applied, ChatStore, TurnTicket};

/// Terminal client for the tutor chat endpoint.
#[derive(Debug, Parser)]
#[command(name = "tutor-chat", version, about)]
struct Args {
    /// Streaming chat endpoint
    #[arg(long, env = "TUTOR_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Number of trailing messages sent with each request
    #[arg(
        long,
        env = "TUTOR_HISTORY_WINDOW",
        default_value_t = DEFAULT_HISTORY_WINDOW,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    history_window: usize,

    #[arg(long, env = "TUTOR_MAX_MESSAGE_LENGTH", default_value_t = DEFAULT_MAX_MESSAGE_LENGTH)]
    max_message_length: usize,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        ClientConfig {
            api_url: args.api_url,
            history_window: args.history_window,
            max_message_length: args.max_message_length,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Send(String),
    New,
    Chats,
    Switch(usize),
    Delete(usize),
    Cards,
    Feedback(Feedback),
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Command::Send(line.to_string()));
        };
        let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let index = || arg.trim().parse::<usize>().ok().filter(|n| *n > 0);

        let command = match name {
            "new" => Command::New,
            "chats" => Command::Chats,
            "switch" => index().map_or(Command::Unknown(line.to_string()), Command::Switch),
            "delete" => index().map_or(Command::Unknown(line.to_string()), Command::Delete),
            "cards" => Command::Cards,
            "like" => Command::Feedback(Feedback::Liked),
            "dislike" => Command::Feedback(Feedback::Disliked),
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        };
        Some(command)
    }
}

const HELP: &str = "\
Type a message to chat. Commands:
  /new            start a new chat
  /chats          list chats
  /switch <n>     switch to chat n
  /delete <n>     delete chat n
  /cards          show flashcards of the current chat
  /like, /dislike rate the last reply (again to clear)
  /help           show this help
  /quit           exit";

/// Prints deltas as they arrive while applying every frame to the store.
struct EchoSink<'a> {
    store: &'a mut ChatStore,
    assistant_id: String,
    printed: String,
}

impl<'a> EchoSink<'a> {
    fn new(store: &'a mut ChatStore, ticket: &TurnTicket) -> Self {
        Self {
            store,
            assistant_id: ticket.assistant_id.clone(),
            printed: String::new(),
        }
    }
}

impl TurnSink for EchoSink<'_> {
    fn on_frame(&mut self, frame: Frame) {
        if let Frame::TextDelta(delta) = &frame {
            print!("{delta}");
            self.printed.push_str(delta);
            let _ = std::io::stdout().flush();
        }
        if let Applied::Flashcards(_) = self.store.apply(&self.assistant_id, frame) {
            if let Some(note) = self.store.notification().cloned() {
                println!("\n[{}]", note.text);
                self.store.dismiss_notification(note.id);
            }
        }
    }

    fn on_complete(&mut self) {
        self.store.finish(&self.assistant_id);
        let finalized = self
            .store
            .chats()
            .iter()
            .find_map(|c| c.message(&self.assistant_id))
            .map(|m| m.content.clone());
        // Print what finalization added: a flashcard suffix or a fallback sentence.
        match finalized {
            Some(content) => match content.strip_prefix(self.printed.as_str()) {
                Some(rest) => println!("{rest}"),
                None => println!("\n{content}"),
            },
            None => println!(),
        }
    }

    fn on_error(&mut self, error: &ChatError) {
        self.store.fail(&self.assistant_id, error);
        println!();
        eprintln!("error: {error}");
    }
}

fn print_chats(store: &ChatStore) {
    let summaries = store.summaries(Utc::now());
    if summaries.is_empty() {
        println!("No chats yet.");
    }
    for (i, chat) in summaries.iter().enumerate() {
        let marker = if chat.is_current { '*' } else { ' ' };
        println!(
            "{marker} {}. {} ({} messages, {})",
            i + 1,
            chat.title,
            chat.message_count,
            chat.day_label
        );
    }
}

fn print_cards(store: &ChatStore) {
    let cards = store.current_chat().map(|c| c.flashcards()).unwrap_or_default();
    if cards.is_empty() {
        println!("No flashcards in this chat.");
    }
    for (i, card) in cards.iter().enumerate() {
        println!("{}. [{}] {}\n   -> {}", i + 1, card.subject, card.question, card.answer);
    }
}

fn chat_id_at(store: &ChatStore, n: usize) -> Option<String> {
    store.chats().get(n - 1).map(|c| c.id.clone())
}

async fn handle(
    command: Command,
    store: &mut ChatStore,
    pipeline: &SendPipeline<ReqwestTransport>,
) -> Result<(), ChatError> {
    match command {
        Command::Send(text) => {
            let ticket = store.submit(&text)?;
            let mut sink = EchoSink::new(store, &ticket);
            // Failures have already been reported by the sink.
            let _ = pipeline.drive(&ticket.history, &mut sink).await;
        }
        Command::New => {
            store.new_chat();
            println!("Started a new chat.");
        }
        Command::Chats => print_chats(store),
        Command::Switch(n) => {
            let id = chat_id_at(store, n).ok_or(ChatError::ChatNotFound { id: n.to_string() })?;
            store.select_chat(&id)?;
            for message in store.current_messages() {
                println!("{}: {}", message.role, message.content);
            }
        }
        Command::Delete(n) => {
            let id = chat_id_at(store, n).ok_or(ChatError::ChatNotFound { id: n.to_string() })?;
            store.delete_chat(&id)?;
            println!("Deleted chat {n}.");
        }
        Command::Cards => print_cards(store),
        Command::Feedback(feedback) => {
            let last = store
                .current_messages()
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::Assistant)
                .map(|m| m.id.clone())
                .ok_or(ChatError::InvalidHistory { message: "no reply to rate yet".to_string() })?;
            store.set_feedback(&last, feedback)?;
        }
        Command::Help => println!("{HELP}"),
        Command::Unknown(line) => println!("Unknown command: {line} (try /help)"),
        Command::Quit => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutor_chat=info".into()),
        )
        .init();

    let config = ClientConfig::from(Args::parse());
    info!("Using chat endpoint {}", config.api_url);

    let mut store = ChatStore::new(&config);
    let pipeline = SendPipeline::new(ReqwestTransport::new(config.api_url.clone()), config);

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = handle(command, &mut store, &pipeline).await {
            eprintln!("error: {e}");
        }
    }
    Ok(())
}
