//! Suggestion email rendering and delivery.
//!
//! The HTML body is rendered from an embedded tera template. Delivery goes
//! through an HTTP mail API (`POST {base_url}/send` with a bearer key) or, with
//! the `log` provider, is only written to the log.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::{error, info};

use foody_core::config::{MailConfig, MailProvider};
use foody_core::domain::restaurant::capitalize_cuisine;
use foody_core::errors::ApplicationError;
use foody_core::ports::SuggestionMailer;
use foody_core::{DiningRequest, Restaurant};

pub const SUGGESTION_SUBJECT: &str = "Restaurant Suggestions from Foody";

const TEMPLATE_NAME: &str = "suggestions.html";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("template error: {0}")]
    Template(String),
    #[error("mail transport error: {0}")]
    Transport(String),
    #[error("mail api rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("mail configuration error: {0}")]
    Configuration(String),
}

impl From<MailError> for ApplicationError {
    fn from(error: MailError) -> Self {
        match error {
            MailError::Configuration(message) => ApplicationError::Configuration(message),
            other => ApplicationError::Integration(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct RestaurantRow<'a> {
    name: &'a str,
    address: &'a str,
    rating: Option<String>,
    reviews: Option<String>,
}

/// Renders the suggestion email body.
#[derive(Clone, Debug)]
pub struct EmailRenderer {
    tera: Tera,
}

impl EmailRenderer {
    pub fn new() -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            TEMPLATE_NAME,
            include_str!("../../../templates/email/suggestions.html.tera"),
        )
        .map_err(|error| MailError::Template(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render(
        &self,
        request: &DiningRequest,
        restaurants: &[Restaurant],
    ) -> Result<String, MailError> {
        let rows = restaurants
            .iter()
            .map(|restaurant| RestaurantRow {
                name: &restaurant.name,
                address: &restaurant.address,
                rating: restaurant.rating.map(|rating| rating.normalize().to_string()),
                reviews: restaurant.reviews.map(|reviews| reviews.to_string()),
            })
            .collect::<Vec<_>>();

        let mut context = Context::new();
        context.insert("subject", SUGGESTION_SUBJECT);
        context.insert("cuisine", &capitalize_cuisine(&request.cuisine));
        context.insert("location", &request.location);
        context.insert("party_size", &request.number_of_people);
        context.insert("dining_date", &request.dining_date.format("%Y-%m-%d").to_string());
        context.insert("dining_time", &request.dining_time);
        context.insert("restaurants", &rows);

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|error| MailError::Template(error.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct SendEmailPayload<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

pub struct HttpMailer {
    client: Client,
    send_url: String,
    api_key: SecretString,
    sender: String,
    renderer: EmailRenderer,
}

impl HttpMailer {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        sender: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| MailError::Configuration(error.to_string()))?;
        Ok(Self {
            client,
            send_url: format!("{}/send", base_url.trim_end_matches('/')),
            api_key,
            sender: sender.into(),
            renderer: EmailRenderer::new()?,
        })
    }

    async fn deliver(
        &self,
        request: &DiningRequest,
        restaurants: &[Restaurant],
    ) -> Result<(), MailError> {
        let html = self.renderer.render(request, restaurants)?;
        let payload = SendEmailPayload {
            from: &self.sender,
            to: vec![request.email.as_str()],
            subject: SUGGESTION_SUBJECT,
            html: &html,
        };

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|error| MailError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}

#[async_trait]
impl SuggestionMailer for HttpMailer {
    async fn send_suggestions(
        &self,
        request: &DiningRequest,
        restaurants: &[Restaurant],
    ) -> Result<(), ApplicationError> {
        match self.deliver(request, restaurants).await {
            Ok(()) => {
                info!(
                    event_name = "mail.suggestions.sent",
                    user_id = %request.user_id,
                    restaurant_count = restaurants.len(),
                    "suggestion email accepted by mail api"
                );
                Ok(())
            }
            Err(error) => {
                error!(
                    event_name = "mail.suggestions.failed",
                    user_id = %request.user_id,
                    error = %error,
                    "suggestion email delivery failed"
                );
                Err(error.into())
            }
        }
    }
}

/// Renders the email and logs it instead of sending; the default provider
/// for local runs.
pub struct LogMailer {
    sender: String,
    renderer: EmailRenderer,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Result<Self, MailError> {
        Ok(Self { sender: sender.into(), renderer: EmailRenderer::new()? })
    }
}

#[async_trait]
impl SuggestionMailer for LogMailer {
    async fn send_suggestions(
        &self,
        request: &DiningRequest,
        restaurants: &[Restaurant],
    ) -> Result<(), ApplicationError> {
        let html = self.renderer.render(request, restaurants)?;
        info!(
            event_name = "mail.suggestions.logged",
            user_id = %request.user_id,
            sender = %self.sender,
            subject = SUGGESTION_SUBJECT,
            restaurant_count = restaurants.len(),
            body_bytes = html.len(),
            "suggestion email rendered (log provider, not sent)"
        );
        Ok(())
    }
}

pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn SuggestionMailer>, MailError> {
    match config.provider {
        MailProvider::Log => Ok(Arc::new(LogMailer::new(config.sender.clone())?)),
        MailProvider::Http => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                MailError::Configuration("mail.base_url is required for the http provider".into())
            })?;
            let api_key = config.api_key.clone().ok_or_else(|| {
                MailError::Configuration("mail.api_key is required for the http provider".into())
            })?;
            Ok(Arc::new(HttpMailer::new(
                base_url,
                api_key,
                config.sender.clone(),
                Duration::from_secs(config.timeout_secs.max(1)),
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use rust_decimal::Decimal;
    use serde_json::Value;

    use foody_core::ports::SuggestionMailer;
    use foody_core::{BusinessId, DiningRequest, Restaurant};

    use super::{EmailRenderer, HttpMailer, LogMailer, SUGGESTION_SUBJECT};

    fn request() -> DiningRequest {
        serde_json::from_value(serde_json::json!({
            "Location": "Manhattan",
            "Cuisine": "italian",
            "DiningDate": "2099-03-14",
            "DiningTime": "19:30",
            "NumberOfPeople": 4,
            "Email": "diner@example.com",
            "user_id": "session-42"
        }))
        .expect("request fixture")
    }

    fn restaurants() -> Vec<Restaurant> {
        vec![
            Restaurant {
                business_id: BusinessId("biz-1".to_string()),
                name: "Trattoria Sole & Luna".to_string(),
                address: "47 Bedford St, New York, NY 10014".to_string(),
                cuisine: "Italian".to_string(),
                rating: Some(Decimal::new(45, 1)),
                reviews: Some(812),
            },
            Restaurant {
                business_id: BusinessId("biz-2".to_string()),
                name: "Via Roma".to_string(),
                address: "315 Amsterdam Ave, New York, NY 10023".to_string(),
                cuisine: "Italian".to_string(),
                rating: None,
                reviews: None,
            },
        ]
    }

    #[test]
    fn renderer_builds_heading_table_and_closing_line() {
        let html = EmailRenderer::new()
            .expect("renderer")
            .render(&request(), &restaurants())
            .expect("render");

        assert!(html.contains("Here are your suggestions for Italian restaurants in Manhattan"));
        for column in ["<th>Name</th>", "<th>Address</th>", "<th>Rating</th>", "<th>Reviews</th>"] {
            assert!(html.contains(column), "missing column {column}");
        }
        assert!(html.contains("Trattoria Sole &amp; Luna"));
        assert!(html.contains("<td>4.5</td>"));
        assert!(html.contains("<td>812</td>"));
        assert!(html.contains("<td>N/A</td>"));
        assert!(html.contains("Hope you like the suggestions."));
    }

    #[test]
    fn missing_figures_render_placeholder_and_zero_stays_a_number() {
        let mut listed = restaurants();
        listed[0].reviews = Some(0);
        listed[1].rating = Some(Decimal::new(30, 1));

        let html = EmailRenderer::new().expect("renderer").render(&request(), &listed).expect("render");

        assert!(html.contains("<td>0</td>"));
        assert!(html.contains("<td>3</td>"));
        assert_eq!(html.matches("<td>N/A</td>").count(), 1);
        assert!(!html.contains("N&#x2F;A"));
    }

    #[tokio::test]
    async fn log_mailer_accepts_without_network() {
        let mailer = LogMailer::new("concierge@foody.example").expect("log mailer");
        mailer.send_suggestions(&request(), &restaurants()).await.expect("logged");
    }

    #[derive(Clone, Default)]
    struct Captured {
        requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn capture(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let auth = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Ok(mut requests) = captured.requests.lock() {
            requests.push((auth, body));
        }
        StatusCode::ACCEPTED
    }

    async fn spawn_mail_api(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}")
    }

    #[tokio::test]
    async fn http_mailer_posts_rendered_email_with_bearer_key() {
        let captured = Captured::default();
        let base_url = spawn_mail_api(
            Router::new().route("/send", post(capture)).with_state(captured.clone()),
        )
        .await;

        let mailer = HttpMailer::new(
            &base_url,
            "mail-key-123".to_string().into(),
            "concierge@foody.example",
            Duration::from_secs(5),
        )
        .expect("mailer");
        mailer.send_suggestions(&request(), &restaurants()).await.expect("send");

        let requests = captured.requests.lock().expect("lock").clone();
        assert_eq!(requests.len(), 1);
        let (auth, body) = &requests[0];
        assert_eq!(auth.as_deref(), Some("Bearer mail-key-123"));
        assert_eq!(body["subject"], SUGGESTION_SUBJECT);
        assert_eq!(body["from"], "concierge@foody.example");
        assert_eq!(body["to"][0], "diner@example.com");
        assert!(body["html"].as_str().unwrap_or_default().contains("Via Roma"));
    }

    #[tokio::test]
    async fn http_mailer_reports_rejection_as_integration_error() {
        let base_url = spawn_mail_api(
            Router::new().route("/send", post(|| async { StatusCode::UNPROCESSABLE_ENTITY })),
        )
        .await;

        let mailer = HttpMailer::new(
            &base_url,
            "mail-key".to_string().into(),
            "concierge@foody.example",
            Duration::from_secs(5),
        )
        .expect("mailer");
        let error = mailer
            .send_suggestions(&request(), &restaurants())
            .await
            .expect_err("rejected send should fail");

        assert!(matches!(error, foody_core::ApplicationError::Integration(ref message) if message.contains("422")));
    }
}
