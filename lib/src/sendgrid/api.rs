pub const SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";
pub const ENDPOINT_JSON: &str = "/api/mail.send.json";

/// Legacy XML endpoint, selectable through configuration.
pub const ENDPOINT_XML: &str = "/api/mail.send.xml";

pub const USER_AGENT: &str = concat!("gridmail/", env!("CARGO_PKG_VERSION"));

// Request timeout, in seconds
pub(crate) const SENDGRID_REQUEST_TIMEOUT: u64 = 30;

/// Synthetic response body used when the transport itself fails.
pub const PROBLEM_CONNECTING: &str = "Problem connecting to SendGrid";

// Multipart field names, per the legacy v2 mail.send contract
pub(crate) const PARAM_API_USER: &str = "api_user";
pub(crate) const PARAM_API_KEY: &str = "api_key";
pub(crate) const PARAM_FROM: &str = "from";
pub(crate) const PARAM_FROMNAME: &str = "fromname";
pub(crate) const PARAM_REPLYTO: &str = "replyto";
pub(crate) const PARAM_SUBJECT: &str = "subject";
pub(crate) const PARAM_HTML: &str = "html";
pub(crate) const PARAM_TEXT: &str = "text";
pub(crate) const PARAM_HEADERS: &str = "headers";
pub(crate) const PARAM_XSMTPAPI: &str = "x-smtpapi";

#[inline]
pub(crate) fn to_param(i: usize) -> String {
    format!("to[{}]", i)
}

#[inline]
pub(crate) fn toname_param(i: usize) -> String {
    format!("toname[{}]", i)
}

#[inline]
pub(crate) fn cc_param(i: usize) -> String {
    format!("cc[{}]", i)
}

#[inline]
pub(crate) fn bcc_param(i: usize) -> String {
    format!("bcc[{}]", i)
}

#[inline]
pub(crate) fn files_param(name: &str) -> String {
    format!("files[{}]", name)
}

/// Normalized outcome of one send attempt.
///
/// The provider's HTTP status and raw body on a completed round trip, or a
/// synthetic 500 when the transport failed. Never persisted.
#[derive(Clone, Debug)]
pub struct Response {
    pub code: u16,
    pub success: bool,
    pub message: String,
}

impl Response {
    pub fn new(code: u16, message: &str) -> Self {
        Self {
            code,
            success: code == 200,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_only_on_200() {
        assert!(Response::new(200, "ok").success);
        assert!(!Response::new(401, "denied").success);
        assert!(!Response::new(500, PROBLEM_CONNECTING).success);
    }

    #[test]
    fn indexed_params() {
        assert_eq!(to_param(0), "to[0]");
        assert_eq!(toname_param(3), "toname[3]");
        assert_eq!(files_param("report.txt"), "files[report.txt]");
    }
}
