//! Lead notification.
//!
//! Called once per captured lead, after persistence has been attempted.
//! Notifiers never fail the conversation; problems are logged.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use leadline_core::types::ContactSubmission;

#[async_trait]
pub trait LeadNotifier: Send + Sync {
    async fn notify(&self, lead: &ContactSubmission);
}

/// Writes the lead to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl LeadNotifier for TracingNotifier {
    async fn notify(&self, lead: &ContactSubmission) {
        info!(
            session_id = %lead.session_id,
            name = %lead.name,
            email = %lead.email,
            project_type = lead.project_type.as_deref().unwrap_or("unspecified"),
            "New lead captured"
        );
    }
}

/// POSTs the lead as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl LeadNotifier for WebhookNotifier {
    async fn notify(&self, lead: &ContactSubmission) {
        match self.client.post(&self.url).json(lead).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(session_id = %lead.session_id, "Lead webhook delivered");
            }
            Ok(resp) => {
                error!(
                    session_id = %lead.session_id,
                    status = resp.status().as_u16(),
                    "Lead webhook rejected"
                );
            }
            Err(e) => {
                error!(session_id = %lead.session_id, error = %e, "Lead webhook failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, routing::post, Json, Router};

    fn lead() -> ContactSubmission {
        ContactSubmission {
            name: "Jane".into(),
            email: "jane@co.com".into(),
            phone: "555-123-4567".into(),
            message: "I need a mobile app".into(),
            project_type: Some("mobile".into()),
            session_id: "s1".into(),
        }
    }

    #[tokio::test]
    async fn test_tracing_notifier_does_not_panic() {
        TracingNotifier.notify(&lead()).await;
    }

    #[tokio::test]
    async fn test_webhook_posts_json() {
        let received: Arc<Mutex<Vec<serde_json::Value>>> = Arc::default();
        let router = Router::new()
            .route(
                "/hook",
                post(
                    |State(store): State<Arc<Mutex<Vec<serde_json::Value>>>>,
                     Json(body): Json<serde_json::Value>| async move {
                        store.lock().unwrap().push(body);
                        "ok"
                    },
                ),
            )
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let notifier = WebhookNotifier::new(format!("http://{addr}/hook")).unwrap();
        notifier.notify(&lead()).await;

        let bodies = received.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["email"], "jane@co.com");
        assert_eq!(bodies[0]["project_type"], "mobile");
    }

    #[tokio::test]
    async fn test_webhook_failure_is_swallowed() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook").unwrap();
        notifier.notify(&lead()).await;
    }
}
