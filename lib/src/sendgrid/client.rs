use std::time::Duration;

use reqwest::multipart;

use crate::config::Config;
use crate::error::Error;
use crate::message::Message;

use super::api;
use super::api::Response;
use super::body::{build_body, BodyPart, PartValue};

/// SendGrid dispatch client.
///
/// Owns the HTTP transport: one POST per `send` call, outcome normalized
/// into a `Response`. The inner reqwest client pools connections, which is
/// safe to share across concurrent sends.
pub struct Client {
    api_user: String,
    api_key: String,
    url: String,
    endpoint: String,
    client: reqwest::Client,
}

impl Client {
    pub fn new(api_user: &str, api_key: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(api::USER_AGENT)
            .timeout(Duration::from_secs(api::SENDGRID_REQUEST_TIMEOUT))
            .build()
            .unwrap();

        Self {
            api_user: api_user.to_string(),
            api_key: api_key.to_string(),
            url: api::SENDGRID_BASE_URL.to_string(),
            endpoint: api::ENDPOINT_JSON.to_string(),
            client,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_user, &config.api_key)
            .set_url(&config.api_url)
            .set_endpoint(&config.endpoint)
    }

    pub fn set_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn set_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Serialize `mail` with this client's credentials. Exposed mainly so
    /// callers can inspect what would go on the wire.
    pub fn build_body(&self, mail: &Message) -> Result<Vec<BodyPart>, Error> {
        build_body(mail, &self.api_user, &self.api_key)
    }

    /// Send one email.
    ///
    /// `Err` is returned only for malformed input, before any network I/O.
    /// Transport failures come back as `Response { 500, .. }` and provider
    /// rejections keep their original status and body, so ordinary delivery
    /// failures never need an error handler.
    pub async fn send(&self, mail: &Message) -> Result<Response, Error> {
        let parts = self.build_body(mail)?;

        let mut form = multipart::Form::new();
        for part in parts {
            form = match part.value {
                PartValue::Text(value) => form.text(part.name, value),
                PartValue::Binary(data) => {
                    // files[<name>] -> <name>
                    let filename = part
                        .name
                        .trim_start_matches("files[")
                        .trim_end_matches(']')
                        .to_string();
                    form.part(part.name, multipart::Part::bytes(data).file_name(filename))
                }
            };
        }

        let url = format!("{}{}", self.url, self.endpoint);
        log::debug!("POST {}", url);

        match self.client.post(&url).multipart(form).send().await {
            Ok(resp) => {
                let code = resp.status().as_u16();
                match resp.text().await {
                    Ok(body) => Ok(Response::new(code, &body)),
                    Err(_) => Ok(Response::new(500, api::PROBLEM_CONNECTING)),
                }
            }
            Err(e) => {
                log::error!("Transport failure: {}", e);
                Ok(Response::new(500, api::PROBLEM_CONNECTING))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_message() -> Message {
        Message::new()
            .add_to("a@x.com", Some("A Name"))
            .set_from("sender@example.org", None)
            .set_subject("Hi")
            .set_text("Body")
    }

    fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Serve exactly one canned HTTP response on a loopback socket and
    /// return the base URL to reach it.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();

            // Drain the full request (headers + content-length bytes)
            // before responding
            let mut buf = vec![0u8; 16 * 1024];
            let mut request = Vec::new();
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);

                if let Some(end) = find_subsequence(&request, b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                    let content_length = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }

            let resp = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn connection_failure_yields_synthetic_500() {
        // Nothing listens on this port
        let client = Client::new("user", "key").set_url("http://127.0.0.1:1");

        let resp = client.send(&test_message()).await.unwrap();

        assert_eq!(resp.code, 500);
        assert!(!resp.success);
        assert_eq!(resp.message, "Problem connecting to SendGrid");
    }

    #[tokio::test]
    async fn provider_rejection_keeps_status_and_body() {
        let url = one_shot_server("401 Unauthorized", r#"{"errors":["bad key"]}"#).await;
        let client = Client::new("user", "bad-key").set_url(&url);

        let resp = client.send(&test_message()).await.unwrap();

        assert_eq!(resp.code, 401);
        assert!(!resp.success);
        assert_eq!(resp.message, r#"{"errors":["bad key"]}"#);
    }

    #[tokio::test]
    async fn accepted_send_is_successful() {
        let url = one_shot_server("200 OK", r#"{"message":"success"}"#).await;
        let client = Client::new("user", "key").set_url(&url);

        let mail = test_message().add_attachment("report.txt", b"contents".to_vec());
        let resp = client.send(&mail).await.unwrap();

        assert_eq!(resp.code, 200);
        assert!(resp.success);
        assert_eq!(resp.message, r#"{"message":"success"}"#);
    }

    #[tokio::test]
    async fn invalid_message_fails_before_any_network_call() {
        let client = Client::new("user", "key").set_url("http://127.0.0.1:1");
        let mail = Message::new().set_subject("Hi").set_text("Body");

        assert!(matches!(
            client.send(&mail).await,
            Err(Error::InvalidArgument(_))
        ));
    }
}
