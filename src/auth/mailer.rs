// Out-of-band delivery seam for reset links
//
// E-mail transport is an external collaborator; this trait is the boundary.
// Implementations receive the raw reset link and must treat it as a secret:
// it is never logged and never persisted.

use tracing::info;

/// Delivery seam for password-reset links
pub trait Mailer: Send + Sync {
    /// Deliver a reset link to `to`. Fire-and-forget: a delivery failure
    /// must not change the HTTP response (enumeration resistance).
    fn send_password_reset(&self, to: &str, reset_link: &str);
}

/// Default transport for deployments without SMTP wiring: records that a
/// delivery happened without exposing the link (it contains the raw token)
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_password_reset(&self, to: &str, _reset_link: &str) {
        info!(
            "Password-reset link issued for {} (delivery delegated, link not logged)",
            crate::auth::service::mask_email(to)
        );
    }
}
