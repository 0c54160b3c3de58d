pub mod completion;
pub mod inbox;
pub mod open;
pub mod reply;
pub mod watch;

use anyhow::Result;
use client::HttpTransport;

/// Builds a transport for `server`, attaching the admin token when given.
pub fn transport(server: &str, admin_token: Option<&str>) -> Result<HttpTransport> {
    let transport = HttpTransport::new(server)?;
    Ok(match admin_token {
        Some(token) => transport.with_admin_token(token),
        None => transport,
    })
}
