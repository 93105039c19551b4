use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use MailMemoClient::channel::{record_outbound, ChatReceiver, ChatSender};
use MailMemoClient::config::{self, AppConfig};
use MailMemoClient::models::message::{ChatMessage, Transcript};
use MailMemoClient::models::wire::HistoryResponse;
use MailMemoClient::render::TerminalRenderer;
use MailMemoClient::services::backend::BackendClient;
use MailMemoClient::services::identity::GoogleIdentity;
use MailMemoClient::session::SessionController;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    config::init_logging();

    let app_config = AppConfig::from_env()?;
    info!("Using backend {}", app_config.backend_url);

    let renderer = TerminalRenderer::new();
    let identity = GoogleIdentity::new(&app_config)?;
    let backend = BackendClient::new(&app_config)?;

    let mut controller = SessionController::new(
        app_config,
        Box::new(identity),
        Box::new(backend),
        Box::new(renderer.clone()),
    );

    // The whole sign-in sequence runs once; any failure is terminal and the
    // user restarts the client.
    controller.run().await?;

    let channel = controller
        .take_channel()
        .context("chat channel missing after connect")?;
    let (sender, receiver) = channel.split();

    chat_loop(controller, sender, receiver, renderer).await
}

async fn chat_loop(
    controller: SessionController,
    mut sender: ChatSender,
    mut receiver: ChatReceiver,
    renderer: TerminalRenderer,
) -> anyhow::Result<()> {
    let transcript = Arc::new(Mutex::new(Transcript::new()));

    {
        let mut t = transcript.lock().await;
        let entry = t.append(ChatMessage::system(
            "Connected to chat. Type a message, /history, or /quit.",
        ));
        renderer.print_entry(entry);
    }

    // Inbound frames can arrive at any time; the reader task appends them
    // to the transcript as they come in.
    let reader_transcript = transcript.clone();
    let reader_renderer = renderer.clone();
    let reader = tokio::spawn(async move {
        while let Some(message) = receiver.next_event().await {
            let mut t = reader_transcript.lock().await;
            let entry = t.append(message);
            reader_renderer.print_entry(entry);
        }
        info!("Chat channel reader finished");
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim().to_string();
        match input.as_str() {
            "/quit" | "/exit" => break,
            "/history" => match controller.history().await {
                Ok(history) => print_history(&history),
                Err(e) => renderer
                    .print_entry(&ChatMessage::system(format!("Could not load history: {}", e))),
            },
            _ => {
                // Whitespace-only input sends nothing and records nothing.
                sender.send(&input).await?;
                let mut t = transcript.lock().await;
                if let Some(entry) = record_outbound(&mut t, &input) {
                    renderer.print_entry(entry);
                }
            }
        }
    }

    reader.abort();
    Ok(())
}

fn print_history(history: &HistoryResponse) {
    if !history.success || history.chats.is_empty() {
        println!("No stored chats.");
        return;
    }
    println!("Stored chats ({} messages):", history.total_messages);
    for (chat_id, exchanges) in &history.chats {
        println!("- chat {}", chat_id);
        for exchange in exchanges {
            if let Some(question) = &exchange.user_message {
                println!("    You: {}", question);
            }
            if let Some(answer) = &exchange.ai_response {
                println!("    Bot: {}", answer);
            }
        }
    }
}
