use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::Error;
use crate::smtpapi::SmtpApi;

/// A single mailbox: address plus optional display name.
#[derive(Clone, Debug)]
pub struct Address {
    pub email: String,
    pub name: Option<String>,

    /// Caller-supplied validity flag. Suppressed recipients stay in the
    /// list but are skipped by `Message::recipients`.
    pub addressable: bool,
}

impl Address {
    pub fn new(email: &str, name: Option<&str>) -> Self {
        Self {
            email: email.to_string(),
            name: name.map(|n| n.to_string()),
            addressable: true,
        }
    }

    pub fn unaddressable(mut self) -> Self {
        self.addressable = false;
        self
    }

    /// A minimal syntactic check: non-blank and contains an `@`.
    pub fn is_addressable(&self) -> bool {
        let email = self.email.trim();
        self.addressable && !email.is_empty() && email.contains('@')
    }
}

/// Structured description of one outbound email, before wire serialization.
///
/// Built with consuming fluent methods; once handed to the request builder
/// it is only ever read. Not meant to be mutated from multiple writers.
#[derive(Clone, Debug, Default)]
pub struct Message {
    from: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    reply_to: Option<String>,
    subject: String,
    text: String,
    html: Option<String>,

    /// Filename -> content. Unique filenames; last write wins.
    attachments: BTreeMap<String, Vec<u8>>,

    headers: BTreeMap<String, String>,
    smtpapi: SmtpApi,
}

impl Message {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_to(mut self, email: &str, name: Option<&str>) -> Self {
        self.to.push(Address::new(email, name));
        self
    }

    pub fn add_recipient(mut self, recipient: Address) -> Self {
        self.to.push(recipient);
        self
    }

    pub fn add_cc(mut self, email: &str, name: Option<&str>) -> Self {
        self.cc.push(Address::new(email, name));
        self
    }

    pub fn add_bcc(mut self, email: &str, name: Option<&str>) -> Self {
        self.bcc.push(Address::new(email, name));
        self
    }

    pub fn set_from(mut self, email: &str, name: Option<&str>) -> Self {
        self.from = Some(Address::new(email, name));
        self
    }

    pub fn set_reply_to(mut self, reply_to: &str) -> Self {
        self.reply_to = Some(reply_to.to_string());
        self
    }

    pub fn set_subject(mut self, subject: &str) -> Self {
        self.subject = subject.to_string();
        self
    }

    pub fn set_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn set_html(mut self, html: &str) -> Self {
        self.html = Some(html.to_string());
        self
    }

    /// Attach raw bytes under `name`.
    pub fn add_attachment(mut self, name: &str, data: Vec<u8>) -> Self {
        self.attachments.insert(name.to_string(), data);
        self
    }

    /// Attach a string, encoded as UTF-8 bytes.
    pub fn add_attachment_text(self, name: &str, content: &str) -> Self {
        self.add_attachment(name, content.as_bytes().to_vec())
    }

    /// Attach the full contents of a reader. The source is drained here,
    /// exactly once, so no handle stays open past this call.
    pub fn add_attachment_reader<R: Read>(self, name: &str, mut reader: R) -> Result<Self, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(self.add_attachment(name, data))
    }

    /// Attach a file from disk. Fails before any network call if the path
    /// cannot be opened or read.
    pub fn add_attachment_file(self, name: &str, path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)?;
        self.add_attachment_reader(name, file)
    }

    pub fn add_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn add_substitution(mut self, key: &str, values: Vec<String>) -> Self {
        self.smtpapi.add_substitution(key, values);
        self
    }

    pub fn add_unique_arg(mut self, key: &str, value: &str) -> Self {
        self.smtpapi.add_unique_arg(key, value);
        self
    }

    pub fn add_category(mut self, category: &str) -> Self {
        self.smtpapi.add_category(category);
        self
    }

    pub fn add_section(mut self, key: &str, value: &str) -> Self {
        self.smtpapi.add_section(key, value);
        self
    }

    pub fn add_filter(mut self, filter: &str, param: &str, value: serde_json::Value) -> Self {
        self.smtpapi.add_filter(filter, param, value);
        self
    }

    pub fn from(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    pub fn tos(&self) -> &[Address] {
        &self.to
    }

    pub fn ccs(&self) -> &[Address] {
        &self.cc
    }

    pub fn bccs(&self) -> &[Address] {
        &self.bcc
    }

    pub fn reply_to(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn attachments(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.attachments
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn smtpapi(&self) -> &SmtpApi {
        &self.smtpapi
    }

    /// Only valid recipients.
    ///
    /// Fails if the `to` list is empty, or if no addressable recipient
    /// remains after filtering.
    pub fn recipients(&self) -> Result<Vec<&Address>, Error> {
        if self.to.is_empty() {
            return Err(Error::InvalidArgument(
                "Unable to send mail, no recipients".to_string(),
            ));
        }

        let recipients: Vec<&Address> = self.to.iter().filter(|r| r.is_addressable()).collect();

        log::info!("Found {} valid recipients", recipients.len());

        if recipients.is_empty() {
            return Err(Error::InvalidArgument(
                "Unable to send mail, no valid recipients".to_string(),
            ));
        }

        Ok(recipients)
    }

    /// Full pre-dispatch validation, run before any part of the request
    /// body is built.
    pub fn validate(&self) -> Result<(), Error> {
        self.recipients()?;

        match self.from {
            Some(ref from) if !from.email.trim().is_empty() => (),
            _ => {
                return Err(Error::InvalidArgument(
                    "Unable to send mail, no sender address".to_string(),
                ))
            }
        }

        if self.subject.is_empty() {
            return Err(Error::InvalidArgument(
                "Unable to send mail, no subject".to_string(),
            ));
        }

        if self.text.is_empty() && self.html.as_deref().map_or(true, |h| h.is_empty()) {
            return Err(Error::InvalidArgument(
                "Unable to send mail, no text or html body".to_string(),
            ));
        }

        // Substitution arrays are positional over the `to` list
        for (key, values) in self.smtpapi.substitutions() {
            if values.len() != self.to.len() {
                return Err(Error::InvalidArgument(format!(
                    "Substitution {} has {} values for {} recipients",
                    key,
                    values.len(),
                    self.to.len()
                )));
            }
        }

        Ok(())
    }
}
