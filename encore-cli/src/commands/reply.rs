use anyhow::Result;
use clap::Args;
use client::SupportTransport;
use shared::models::{MessageKind, ReplyRequest};

#[derive(Args, Debug)]
#[command(about = "Send a support reply to a conversation")]
pub struct ReplyArgs {
    /// Conversation identifier to reply in
    #[arg(long, alias = "conv")]
    pub conversation: i64,

    /// Reply text content (or a GIF URL with --gif)
    #[arg()]
    pub text: String,

    /// Treat the content as a GIF URL
    #[arg(long)]
    pub gif: bool,

    /// Encore server base URL
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,

    /// Shared secret for the admin surface
    #[arg(long)]
    pub admin_token: Option<String>,
}

pub async fn handle_reply(args: ReplyArgs) -> Result<()> {
    let transport = super::transport(&args.server, args.admin_token.as_deref())?;
    let kind = if args.gif {
        MessageKind::Gif
    } else {
        MessageKind::Text
    };

    let message = transport
        .send_reply(
            args.conversation,
            ReplyRequest {
                content: args.text,
                kind,
            },
        )
        .await?;

    println!(
        "Reply created: message={} conversation={}",
        message.id, message.conversation_id
    );
    Ok(())
}
