use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::DeliveryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentEmail {
    #[serde(default)]
    pub id: Option<String>,
}

/// External transactional email service.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, DeliveryError>;
}

/// Used when no email API key is configured; every send fails with `NotConfigured`.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _email: &OutgoingEmail) -> Result<SentEmail, DeliveryError> {
        Err(DeliveryError::NotConfigured)
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: Option<String>,
}

/// JSON-over-HTTPS mailer for Resend-compatible APIs.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail, DeliveryError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return match response.json::<SentEmail>().await {
                Ok(sent) => Ok(sent),
                Err(err) => {
                    warn!(
                        status = status.as_u16(),
                        error = %err,
                        "email accepted but the provider response had no readable id"
                    );
                    Ok(SentEmail::default())
                }
            };
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderError>(&body)
            .ok()
            .and_then(|parsed| parsed.message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string()
            });
        error!(status = status.as_u16(), %message, "email provider rejected message");

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "dana@reyesbakery.test".to_string(),
            reply_to: Some("hello@north.test".to_string()),
            subject: "Invoice INV-0042 from North Studio".to_string(),
            html: "<p>hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn posts_json_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .and(body_partial_json(json!({
                "from": "North Studio <billing@north.test>",
                "to": ["dana@reyesbakery.test"],
                "reply_to": "hello@north.test",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "em_123"})))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(
            format!("{}/emails", server.uri()),
            "re_test",
            "North Studio <billing@north.test>",
        )
        .unwrap();

        let sent = mailer.send(&email()).await.unwrap();
        assert_eq!(sent.id.as_deref(), Some("em_123"));
    }

    #[tokio::test]
    async fn accepted_send_without_readable_id_still_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202).set_body_string("queued"))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(server.uri(), "re_test", "billing@north.test").unwrap();
        let sent = mailer.send(&email()).await.unwrap();
        assert_eq!(sent, SentEmail::default());
    }

    #[tokio::test]
    async fn provider_errors_surface_their_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"message": "The to field is invalid."})),
            )
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(server.uri(), "re_test", "billing@north.test").unwrap();
        let err = mailer.send(&email()).await.unwrap_err();

        match err {
            DeliveryError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "The to field is invalid.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn disabled_mailer_refuses() {
        let err = DisabledMailer.send(&email()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::NotConfigured));
    }
}
