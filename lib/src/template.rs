use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::Identity;

pub const RECIPIENT_EMAIL: &str = "${recipientEmail}";
pub const RECIPIENT_FIRST_NAME: &str = "${recipientFirstName}";
pub const RECIPIENT_LAST_NAME: &str = "${recipientLastName}";
pub const SENDER_EMAIL: &str = "${senderEmail}";
pub const CONFIRMATION_URI: &str = "${confirmationUri}";

/// Parameter key that triggers confirmation-link resolution.
pub const CONFIRMATION_TOKEN: &str = "confirmationToken";

/// Owns confirmation-link generation. Returning an empty string means no
/// link is available and the send proceeds without one.
pub trait ConfirmationResolver {
    fn resolve(&self, token: &str) -> String;
}

/// Default resolver: appends the token to a configured base URL.
pub struct ConfirmationUrl {
    base: Option<String>,
}

impl ConfirmationUrl {
    pub fn new(base: Option<String>) -> Self {
        Self { base }
    }
}

impl ConfirmationResolver for ConfirmationUrl {
    fn resolve(&self, token: &str) -> String {
        match self.base {
            Some(ref base) => format!("{}{}", base, token),
            None => String::new(),
        }
    }
}

/// Substitution variables for one send: placeholder token -> encoded value
/// array, aligned positionally with the `to` list. Transient; merged into
/// the message's extended metadata and discarded after serialization.
#[derive(Debug, Default)]
pub struct SubstitutionSet {
    inner: BTreeMap<String, Vec<String>>,
}

impl SubstitutionSet {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, key: &str, values: Vec<String>) {
        self.inner.insert(key.to_string(), values);
    }

    pub fn get(&self, key: &str) -> Option<&Vec<String>> {
        self.inner.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn into_iter(self) -> impl Iterator<Item = (String, Vec<String>)> {
        self.inner.into_iter()
    }
}

/// Decode an alternating key/value parameter list into a map.
/// Even-indexed entries are keys. A trailing key with no value is dropped.
pub fn decode_params(params: &[&str]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    for pair in params.chunks(2) {
        if pair.len() < 2 {
            log::warn!("Dropping parameter {} with no value", pair[0]);
            continue;
        }
        map.insert(pair[0].to_string(), pair[1].to_string());
    }

    map
}

/// MIME-safe encoding for the fixed per-recipient fields. Handles
/// non-ASCII input; templates decode on the provider side.
fn mime_encode(value: &str) -> String {
    BASE64.encode(value.as_bytes())
}

fn uri_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Build the substitution set consumed by the provider's template filter.
///
/// Fixed per-recipient fields are MIME-encoded; the confirmation URI, when
/// one resolves, is percent-encoded; all remaining parameters are passed
/// through raw, each as a single-element array.
pub fn build_substitutions(
    sender_email: &str,
    recipient: &Identity,
    params: &BTreeMap<String, String>,
    resolver: &dyn ConfirmationResolver,
) -> SubstitutionSet {
    let mut subs = SubstitutionSet::new();

    subs.insert(RECIPIENT_EMAIL, vec![mime_encode(&recipient.email)]);
    subs.insert(
        RECIPIENT_FIRST_NAME,
        vec![mime_encode(&recipient.first_name)],
    );
    subs.insert(RECIPIENT_LAST_NAME, vec![mime_encode(&recipient.last_name)]);

    if let Some(token) = params.get(CONFIRMATION_TOKEN) {
        let uri = resolver.resolve(token);
        if !uri.is_empty() {
            subs.insert(CONFIRMATION_URI, vec![uri_encode(&uri)]);
        }
    }

    subs.insert(SENDER_EMAIL, vec![sender_email.to_string()]);

    for (key, value) in params {
        if key == CONFIRMATION_TOKEN {
            continue;
        }
        subs.insert(&format!("${{{}}}", key), vec![value.clone()]);
    }

    subs
}
