use anyhow::Result;
use clap::Args;
use client::SupportTransport;
use shared::models::OpenConversationRequest;

#[derive(Args, Debug)]
#[command(about = "Open a conversation the way a customer would")]
pub struct OpenArgs {
    /// Customer display name
    #[arg(long)]
    pub name: String,

    /// Customer contact email
    #[arg(long)]
    pub email: String,

    /// Optional first message to seed the thread
    #[arg(long)]
    pub message: Option<String>,

    /// Encore server base URL
    #[arg(long, default_value = "http://localhost:8080")]
    pub server: String,

    /// Shared secret for the admin surface
    #[arg(long)]
    pub admin_token: Option<String>,
}

pub async fn handle_open(args: OpenArgs) -> Result<()> {
    let transport = super::transport(&args.server, args.admin_token.as_deref())?;
    let summary = transport
        .open_conversation(OpenConversationRequest {
            customer_name: args.name,
            customer_email: args.email,
            initial_message: args.message,
        })
        .await?;

    println!(
        "Conversation opened: id={} customer_user_id={}",
        summary.id, summary.customer_user_id
    );
    Ok(())
}
