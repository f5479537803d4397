use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use ephemeral_chat::auth::SignUpOutcome;
use ephemeral_chat::calls::NOTICE;
use ephemeral_chat::composer::ComposeError;
use ephemeral_chat::config::{ClientConfig, DEFAULT_GEMINI_MODEL, DEFAULT_MEDIA_BUCKET};
use ephemeral_chat::http::UreqHttpClient;
use ephemeral_chat::realtime::WebSocketFeed;
use ephemeral_chat::recorder::{FileCapture, Recorder};
use ephemeral_chat::types::{CallKind, Message, Payload, UserId};
use ephemeral_chat::ChatApp;
use log::{error, warn};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};

// Terminal client for the chat backend.
//
// Usage:
//   ephemeral-chat --email me@example.com --password secret sign-up
//   ephemeral-chat --email me@example.com --password secret contacts
//   ephemeral-chat --email me@example.com --password secret chat --contact bob

/// Realtime chat with AI reply suggestions
#[derive(Parser)]
#[command(name = "ephemeral-chat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(long, env = "SUPABASE_URL")]
    url: String,

    /// Public API key of the backend
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    anon_key: String,

    /// Generative-language API key; suggestions are disabled without it
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    gemini_key: Option<String>,

    /// Model used for reply suggestions
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    model: String,

    /// Storage bucket for voice messages
    #[arg(long, env = "MEDIA_BUCKET", default_value = DEFAULT_MEDIA_BUCKET)]
    bucket: String,

    #[arg(long, env = "CHAT_EMAIL")]
    email: String,

    #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    SignUp,
    /// List contacts
    Contacts,
    /// Open a conversation and chat interactively
    Chat {
        /// Contact username (defaults to the first contact)
        #[arg(short, long)]
        contact: Option<String>,
    },
}

enum Input {
    Line(Option<String>),
    Row(Option<Value>),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:<5}] [{}] - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::new(&cli.url, &cli.anon_key).with_gemini_key(cli.gemini_key);
    config.suggestion.model = cli.model;
    config.media_bucket = cli.bucket;

    let feed = WebSocketFeed::new(&config);
    let mut app = ChatApp::builder()
        .with_config(config)
        .with_http_client(UreqHttpClient::new())
        .with_feed(feed)
        .build()?;

    match cli.command {
        Commands::SignUp => cmd_sign_up(&mut app, &cli.email, &cli.password).await,
        Commands::Contacts => {
            app.sign_in(&cli.email, &cli.password).await?;
            cmd_contacts(&mut app).await
        }
        Commands::Chat { contact } => {
            app.sign_in(&cli.email, &cli.password).await?;
            cmd_chat(&mut app, contact.as_deref()).await
        }
    }
}

async fn cmd_sign_up(app: &mut ChatApp, email: &str, password: &str) -> Result<()> {
    match app.sign_up(email, password).await? {
        SignUpOutcome::SignedIn(session) => println!("Signed up and signed in as {}", session.user.id),
        SignUpOutcome::ConfirmationRequired => {
            println!("Check your email for the confirmation link!")
        }
    }
    Ok(())
}

async fn cmd_contacts(app: &mut ChatApp) -> Result<()> {
    let contacts = app.load_contacts().await?;
    if contacts.is_empty() {
        println!("No contacts yet.");
    }
    for contact in contacts {
        println!("{:<20} {}", contact.username, contact.avatar_or_placeholder(40));
    }
    Ok(())
}

async fn cmd_chat(app: &mut ChatApp, contact: Option<&str>) -> Result<()> {
    app.load_contacts_selecting(contact).await?;
    if app.active_contact().is_none() {
        println!("No contacts to chat with.");
        return Ok(());
    }
    print_conversation(app);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let live = app.conversation().is_some_and(|c| c.is_live());
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            row = next_row(app), if live => Input::Row(row),
        };

        match input {
            Input::Line(None) => break,
            Input::Line(Some(line)) => {
                if !handle_line(app, line.trim()).await? {
                    break;
                }
            }
            Input::Row(Some(row)) => {
                let me = app.client().user_id().await;
                if let Some(message) = admit_row(app, row).await {
                    print_message(&message, me.as_ref());
                }
            }
            Input::Row(None) => warn!("Live updates stopped; restart the chat to reconnect"),
        }
    }
    app.sign_out().await?;
    Ok(())
}

async fn next_row(app: &mut ChatApp) -> Option<Value> {
    app.conversation_mut()?.recv_row().await
}

async fn admit_row(app: &mut ChatApp, row: Value) -> Option<Message> {
    app.conversation_mut()?.admit(row).await
}

/// Returns `false` when the user asked to quit.
async fn handle_line(app: &mut ChatApp, line: &str) -> Result<bool> {
    let (command, arg) = match line.split_once(' ') {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "/quit" | "/exit" => return Ok(false),
        "/help" => print_help(),
        "/suggest" => {
            println!("Thinking...");
            let suggestion = app.suggest_reply().await;
            println!("Suggested reply: {suggestion}");
            println!("Type /send to send it.");
        }
        "/send" => report_send(app.send_draft().await),
        "/audio" => {
            if arg.is_empty() {
                println!("Usage: /audio PATH");
            } else {
                send_recording(app, arg).await;
            }
        }
        "/call" => match arg.parse::<CallKind>() {
            Ok(kind) => match app.start_call(kind) {
                Ok(call) => {
                    println!("{} with {}", call.status_line(), call.contact.username);
                    if call.shows_video_placeholder() {
                        println!("[video unavailable]");
                    }
                    println!("{NOTICE}");
                    println!("Type /hangup to end the call.");
                }
                Err(e) => println!("{e}"),
            },
            Err(e) => println!("{e}"),
        },
        "/hangup" => match app.end_call() {
            Some(call) => println!("{} call with {} ended", call.kind, call.contact.username),
            None => println!("No call in progress."),
        },
        "/switch" => match switch_to(app, arg).await {
            Ok(()) => print_conversation(app),
            Err(e) => println!("{e}"),
        },
        _ if command.starts_with('/') => println!("Unknown command {command}; try /help"),
        _ => report_send(app.send_text(line).await),
    }
    Ok(true)
}

async fn switch_to(app: &mut ChatApp, name: &str) -> Result<()> {
    let id = app
        .find_contact(name)
        .map(|c| c.id.clone())
        .ok_or_else(|| anyhow::anyhow!("No contact named {}", name))?;
    app.select_contact(&id).await?;
    Ok(())
}

async fn send_recording(app: &mut ChatApp, path: &str) {
    let Some(composer) = app.composer() else {
        println!("Select a contact first.");
        return;
    };
    let mut recorder = Recorder::new(FileCapture::new(path));
    if let Err(e) = recorder.start().await {
        println!("Could not access the recording: {e}");
        return;
    }
    println!("Recording... sending.");
    match recorder.stop_and_send(composer).await {
        Ok(_) => {}
        Err(ComposeError::Upload(e)) => {
            error!("Error uploading audio: {e}");
            println!("Failed to upload recording.");
        }
        Err(e) => println!("Could not send recording: {e}"),
    }
}

fn report_send<T>(result: Result<T, ComposeError>) {
    match result {
        Ok(_) => {}
        Err(ComposeError::EmptyMessage) => println!("Nothing to send."),
        Err(e) => {
            error!("Error sending message: {e}");
            println!("Message not sent: {e}");
        }
    }
}

fn print_conversation(app: &ChatApp) {
    let Some(conversation) = app.conversation() else {
        return;
    };
    let me = &conversation.pair().me;
    println!();
    println!("--- {} ---", conversation.contact().username);
    if conversation.messages().is_empty() {
        println!("No messages yet. Say hi!");
    }
    for message in conversation.messages() {
        print_message(message, Some(me));
    }
    if !conversation.is_live() {
        println!("(live updates unavailable)");
    }
}

fn print_message(message: &Message, me: Option<&UserId>) {
    let time = message.created_at.with_timezone(&Local).format("%H:%M");
    let who = if me.is_some_and(|me| message.is_from(me)) {
        "You"
    } else {
        message.sender_name.as_str()
    };
    match message.payload() {
        Payload::Text(text) => println!("[{time}] {who}: {text}"),
        Payload::Media(url) => println!("[{time}] {who}: [voice message] {url}"),
        Payload::Empty => {}
    }
}

fn print_help() {
    println!("Type a message and press enter to send it.");
    println!("  /suggest        suggest a reply");
    println!("  /send           send the current draft");
    println!("  /audio PATH     send a recorded clip");
    println!("  /call audio|video, /hangup");
    println!("  /switch NAME    chat with another contact");
    println!("  /quit");
}
