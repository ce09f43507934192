use crate::error::Error;
use crate::message::Message;

use super::api;

#[derive(Clone, Debug, PartialEq)]
pub enum PartValue {
    Text(String),
    Binary(Vec<u8>),
}

/// One part of the multipart request body.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyPart {
    pub name: String,
    pub value: PartValue,
}

impl BodyPart {
    fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: PartValue::Text(value.to_string()),
        }
    }

    fn binary(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            value: PartValue::Binary(data),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self.value {
            PartValue::Text(ref s) => Some(s),
            PartValue::Binary(_) => None,
        }
    }
}

/// Serialize a message into the ordered list of multipart parts expected by
/// the legacy mail.send endpoint.
///
/// Pure transform: validates the message, then emits credentials, the
/// indexed recipient arrays, attachments, the headers JSON, the scalar
/// fields, and finally the x-smtpapi block (omitted when empty). The
/// message itself is never mutated, so one message may be serialized for
/// several sends.
pub fn build_body(mail: &Message, api_user: &str, api_key: &str) -> Result<Vec<BodyPart>, Error> {
    mail.validate()?;

    let mut parts = Vec::new();

    parts.push(BodyPart::text(api::PARAM_API_USER, api_user));
    parts.push(BodyPart::text(api::PARAM_API_KEY, api_key));

    for (i, to) in mail.tos().iter().enumerate() {
        parts.push(BodyPart::text(&api::to_param(i), &to.email));
    }
    // toname is its own indexed array; entries without a display name do
    // not occupy an index
    for (i, name) in mail
        .tos()
        .iter()
        .filter_map(|to| to.name.as_deref())
        .enumerate()
    {
        parts.push(BodyPart::text(&api::toname_param(i), name));
    }
    for (i, cc) in mail.ccs().iter().enumerate() {
        parts.push(BodyPart::text(&api::cc_param(i), &cc.email));
    }
    for (i, bcc) in mail.bccs().iter().enumerate() {
        parts.push(BodyPart::text(&api::bcc_param(i), &bcc.email));
    }

    for (name, data) in mail.attachments() {
        parts.push(BodyPart::binary(&api::files_param(name), data.clone()));
    }

    if !mail.headers().is_empty() {
        let headers = serde_json::to_string(mail.headers())?;
        parts.push(BodyPart::text(api::PARAM_HEADERS, &headers));
    }

    if let Some(from) = mail.from() {
        if !from.email.is_empty() {
            parts.push(BodyPart::text(api::PARAM_FROM, &from.email));
        }
        if let Some(ref name) = from.name {
            if !name.is_empty() {
                parts.push(BodyPart::text(api::PARAM_FROMNAME, name));
            }
        }
    }

    if let Some(reply_to) = mail.reply_to() {
        if !reply_to.is_empty() {
            parts.push(BodyPart::text(api::PARAM_REPLYTO, reply_to));
        }
    }

    if !mail.subject().is_empty() {
        parts.push(BodyPart::text(api::PARAM_SUBJECT, mail.subject()));
    }

    if let Some(html) = mail.html() {
        if !html.is_empty() {
            parts.push(BodyPart::text(api::PARAM_HTML, html));
        }
    }

    if !mail.text().is_empty() {
        parts.push(BodyPart::text(api::PARAM_TEXT, mail.text()));
    }

    if !mail.smtpapi().is_empty() {
        parts.push(BodyPart::text(api::PARAM_XSMTPAPI, &mail.smtpapi().json_string()?));
    }

    Ok(parts)
}
