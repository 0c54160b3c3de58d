use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Args;
use client::{SupportTransport, SyncEngine, SyncEvent};
use shared::{
    config::SyncConfig,
    models::{Message, SUPPORT_USER_ID},
};

#[derive(Args, Debug)]
#[command(about = "Follow a conversation live (push with polling fallback)")]
pub struct WatchArgs {
    /// Conversation identifier to follow
    #[arg(long, alias = "conv")]
    pub conversation: i64,

    /// Encore server base URL
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,

    /// Shared secret for the admin surface
    #[arg(long)]
    pub admin_token: Option<String>,
}

pub async fn handle_watch(args: WatchArgs) -> Result<()> {
    let transport = super::transport(&args.server, args.admin_token.as_deref())?;

    let conversations = transport.conversations().await?;
    let summary = conversations
        .iter()
        .find(|conversation| conversation.id == args.conversation)
        .ok_or_else(|| anyhow!("conversation {} not found", args.conversation))?;
    let counterpart = summary.customer_user_id;

    // Opening the thread counts as reading it.
    transport.mark_read(args.conversation).await?;

    println!(
        "Watching conversation {} with {}... (press Ctrl+C to stop)",
        summary.id, summary.customer_name
    );

    let transport: Arc<dyn SupportTransport> = Arc::new(transport);
    let (handle, mut events) = SyncEngine::spawn(transport, &SyncConfig::default(), SUPPORT_USER_ID);
    handle.select(args.conversation, counterpart);

    let mut printed = 0usize;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => render_event(&event, &mut printed),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                handle.shutdown();
                break;
            }
        }
    }
    Ok(())
}

fn render_event(event: &SyncEvent, printed: &mut usize) {
    match event {
        SyncEvent::Messages { messages, .. } => {
            if messages.len() < *printed {
                *printed = 0;
            }
            for message in &messages[*printed..] {
                render_message(message);
            }
            *printed = messages.len();
        }
        SyncEvent::PeerTyping(true) => println!("  … typing"),
        SyncEvent::Mode(mode) => println!("  (delivery mode: {mode:?})"),
        _ => {}
    }
}

fn render_message(message: &Message) {
    let side = if message.from_support {
        "support"
    } else {
        "customer"
    };
    println!("[{}] {side}: {}", message.created_at, message.content);
}
