use async_trait::async_trait;

/// Outbound mail. Delivery itself is handled by an external relay; the
/// service only hands over the rendered message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> anyhow::Result<()>;
}

/// Builds the link the frontend serves the reset form on.
pub fn password_reset_url(frontend_url: &str, token: &str) -> String {
    format!(
        "{}/reset-password?token={}",
        frontend_url.trim_end_matches('/'),
        token
    )
}

/// Replaces the value of the `token` query parameter. Reset links are
/// bearer credentials and must not reach the logs.
fn redact_token(url: &str) -> String {
    match url.split_once("token=") {
        Some((base, rest)) => {
            let tail = rest.find('&').map(|at| &rest[at..]).unwrap_or("");
            format!("{}token=[redacted]{}", base, tail)
        }
        None => url.to_string(),
    }
}

fn log_password_reset(to_email: &str, reset_url: &str) {
    let link = redact_token(reset_url);
    tracing::info!(to = %to_email, %link, "password reset mail queued");
}

/// Records outgoing mail in the log instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> anyhow::Result<()> {
        log_password_reset(to_email, reset_url);
        Ok(())
    }
}
