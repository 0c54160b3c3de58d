use anyhow::Result;
use clap::Args;
use client::{FetchCache, SupportTransport};
use shared::{
    config::SyncConfig,
    models::{ConversationSummary, PresenceStatus},
};

#[derive(Args, Debug)]
#[command(about = "List support conversations with unread counts")]
pub struct InboxArgs {
    /// Encore server base URL
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,

    /// Shared secret for the admin surface
    #[arg(long)]
    pub admin_token: Option<String>,

    /// Skip the per-customer presence lookup
    #[arg(long)]
    pub no_presence: bool,
}

pub async fn handle_inbox(args: InboxArgs) -> Result<()> {
    let transport = super::transport(&args.server, args.admin_token.as_deref())?;
    let conversations = transport.conversations().await?;

    if conversations.is_empty() {
        println!("Inbox is empty.");
        return Ok(());
    }

    // One shared cache so a customer with several conversations is only
    // looked up once.
    let presence: FetchCache<i64, PresenceStatus> =
        FetchCache::new(SyncConfig::default().presence_ttl());

    for conversation in &conversations {
        let status = if args.no_presence {
            None
        } else {
            presence
                .get_or_fetch(conversation.customer_user_id, || async {
                    transport
                        .presence(conversation.customer_user_id)
                        .await
                        .map(|snapshot| snapshot.status)
                })
                .await
                .ok()
        };
        render_row(conversation, status);
    }
    Ok(())
}

fn render_row(conversation: &ConversationSummary, status: Option<PresenceStatus>) {
    let unread = if conversation.unread > 0 {
        format!(" [{} unread]", conversation.unread)
    } else {
        String::new()
    };
    let status = match status {
        Some(PresenceStatus::Online) => " (online)",
        Some(PresenceStatus::Away) => " (away)",
        _ => "",
    };
    let preview = conversation.last_message.as_deref().unwrap_or("(no messages)");
    println!(
        "#{:<4} {} <{}>{}{}  {}  — {}",
        conversation.id,
        conversation.customer_name,
        conversation.customer_email,
        status,
        unread,
        conversation.last_activity_at,
        preview
    );
}
