// Envoi du mail de reset password via SMTP (lettre)
// Seuls destinataire, sujet et corps texte sont nécessaires

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    Address(String),
    #[error("Failed to build email: {0}")]
    Build(String),
    #[error("Failed to send email: {0}")]
    Transport(String),
}

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl EmailService {
    pub fn new(
        smtp_host: &str,
        username: String,
        password: String,
        from: String,
    ) -> Result<Self, EmailError> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
            .map_err(|e| EmailError::Transport(e.to_string()))?
            .credentials(Credentials::new(username, password))
            .build();

        Ok(EmailService { mailer, from })
    }

    /// Envoie le lien de reset à l'utilisateur
    pub async fn send_reset_email(&self, to: &str, reset_url: &str) -> Result<(), EmailError> {
        let body = format!(
            "You are receiving this because you (or someone else) requested a password reset.\n\n\
             Click the link to reset your password:\n\n{}\n\n\
             If you did not request this, ignore this email.",
            reset_url
        );

        self.send(to, "Password Reset", body).await
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), EmailError> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|_| EmailError::Address(self.from.clone()))?;
        let to: Mailbox = to.parse().map_err(|_| EmailError::Address(to.to_string()))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| EmailError::Transport(e.to_string()))
    }
}
