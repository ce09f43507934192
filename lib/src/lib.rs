pub mod config;
pub mod error;
pub mod message;
pub mod sendgrid;
pub mod smtpapi;
pub mod template;

pub use config::Config;
pub use error::Error;
pub use message::{Address, Message};

use template::{ConfirmationResolver, ConfirmationUrl};

/// Recipient or sender identity as supplied by the caller.
#[derive(Clone, Debug)]
pub struct Identity {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Identity {
    pub fn new(email: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }
}

/// Sends rich e-mail through a pre-registered provider template.
///
/// Holds immutable sender data and the resolved template id. When the
/// logical template name has no configured id, mail goes out as plain
/// subject/body with no substitutions and no template filter.
pub struct TemplateSender {
    sender_email: String,
    sender_name: String,
    template_id: Option<String>,
    body: String,
    client: sendgrid::Client,
    resolver: Box<dyn ConfirmationResolver + Send + Sync>,
}

impl TemplateSender {
    pub fn new(config: &Config, sender_email: &str, sender_name: &str, template_name: &str) -> Self {
        Self {
            sender_email: sender_email.to_string(),
            sender_name: sender_name.to_string(),
            template_id: config.template_id(template_name).map(String::from),
            body: "<p></p>".to_string(),
            client: sendgrid::Client::from_config(config),
            resolver: Box::new(ConfirmationUrl::new(config.confirmation_url.clone())),
        }
    }

    /// HTML body rendered when the template leaves room for one.
    pub fn set_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn set_resolver(mut self, resolver: Box<dyn ConfirmationResolver + Send + Sync>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Assemble the message for one recipient. `params` is an alternating
    /// key/value list; see `template::decode_params`.
    pub fn prepare(&self, recipient: &Identity, subject: &str, params: &[&str]) -> Message {
        let params = template::decode_params(params);
        let toname = format!("{} {}", recipient.first_name.trim(), recipient.last_name);

        let mut mail = Message::new()
            .set_subject(subject)
            .set_html(&self.body)
            // Plain-text fallback mirrors the subject
            .set_text(subject)
            .add_to(&recipient.email, Some(&toname))
            .set_from(&self.sender_email, Some(&self.sender_name));

        if let Some(ref id) = self.template_id {
            let subs = template::build_substitutions(
                &self.sender_email,
                recipient,
                &params,
                self.resolver.as_ref(),
            );
            for (key, values) in subs.into_iter() {
                mail = mail.add_substitution(&key, values);
            }
            mail = mail
                .add_filter("templates", "enabled", 1.into())
                .add_filter("templates", "template_id", id.as_str().into());
        }

        mail
    }

    /// Send and expose the full provider response.
    pub async fn send_detailed(
        &self,
        recipient: &Identity,
        subject: &str,
        params: &[&str],
    ) -> Result<sendgrid::Response, Error> {
        self.client.send(&self.prepare(recipient, subject, params)).await
    }

    /// Send, reducing the outcome to a success flag.
    ///
    /// Failures are logged and swallowed here so that a failed notification
    /// never crashes the calling workflow.
    pub async fn send(&self, recipient: &Identity, subject: &str, params: &[&str]) -> bool {
        log::debug!("Sender {} <{}>", self.sender_name, self.sender_email);

        match self.send_detailed(recipient, subject, params).await {
            Ok(resp) if resp.success => {
                log::debug!(
                    "Sent e-mail with subject {} and template {:?}",
                    subject,
                    self.template_id
                );
                true
            }
            Ok(resp) => {
                log::warn!("E-mail failed ({}) with message: {}", resp.code, resp.message);
                false
            }
            Err(e) => {
                log::debug!("Unable to send: {}", e);
                false
            }
        }
    }
}
