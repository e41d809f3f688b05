//! Remote mail service client
//!
//! This module implements the HTTP client for the remote mail API: listing
//! a mailbox, sending a message, and deleting a message by id. The bearer
//! token is attached to every request through the client's default headers.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use tracing::info;
use url::Url;

use crate::types::error::{Result, SkiffError};
use crate::types::{Email, EmailListResponse, Mailbox, OutgoingEmail};

/// Client for the remote mail API
#[derive(Debug, Clone)]
pub struct MailApi {
    client: Client,
    base_url: Url,
}

impl MailApi {
    /// Create a new client against the given base URL
    ///
    /// The auth token is baked into the client's default headers, so every
    /// request carries it without callers having to think about it.
    pub fn new(base_url: &str, auth_token: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|_| SkiffError::InvalidUrl(base_url.to_string()))?;

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", auth_token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| SkiffError::InvalidInput(format!("Invalid auth token: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SkiffError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Build an endpoint URL under the base URL
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|_| SkiffError::InvalidUrl(format!("{}{}", self.base_url, path)))
    }

    /// Fetch the contents of a mailbox
    ///
    /// Returns the emails in server order.
    pub async fn list_emails(&self, mailbox: Mailbox) -> Result<Vec<Email>> {
        info!("Fetching emails for mailbox: {}", mailbox.title());

        let url = self.endpoint(&format!("mail/{}", mailbox.segment()))?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SkiffError::Server(format!(
                "Failed to fetch {}: {}",
                mailbox.title(),
                status
            )));
        }

        let body: EmailListResponse = response.json().await?;
        Ok(body.emails)
    }

    /// Send an email
    ///
    /// Any non-2xx status maps to a generic send failure.
    pub async fn send_email(&self, email: &OutgoingEmail) -> Result<()> {
        info!("Sending email to {} recipient(s)", email.to.len());

        let url = self.endpoint("mail/send")?;
        let response = self.client.post(url).json(email).send().await?;

        if !response.status().is_success() {
            return Err(SkiffError::Server("Failed to send email".to_string()));
        }

        Ok(())
    }

    /// Delete an email by id
    pub async fn delete_email(&self, id: &str) -> Result<()> {
        info!("Deleting email: {}", id);

        let url = self.endpoint(&format!("mail/delete/{}", id))?;
        let response = self.client.delete(url).send().await?;

        if !response.status().is_success() {
            return Err(SkiffError::Server("Failed to delete email".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = MailApi::new("not a url", "token");
        assert!(matches!(result, Err(SkiffError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_list_emails_parses_server_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/mail/inbox")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"emails": [
                    {"id": "e2", "subject": "Second", "sender": "b@example.com",
                     "preview": "...", "date": "2024-05-02T09:00:00Z", "isRead": true},
                    {"id": "e1", "subject": "First", "sender": "a@example.com",
                     "preview": "...", "date": "2024-05-01T09:00:00Z", "isRead": false}
                ]}"#,
            )
            .create_async()
            .await;

        let api = MailApi::new(&server.url(), "token").unwrap();
        let emails = api.list_emails(Mailbox::Inbox).await.unwrap();

        mock.assert_async().await;
        assert_eq!(emails.len(), 2);
        // Server order is preserved, not re-sorted
        assert_eq!(emails[0].id, "e2");
        assert_eq!(emails[1].id, "e1");
        assert!(!emails[1].is_read);
    }

    #[tokio::test]
    async fn test_list_emails_attaches_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/mail/sent")
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_body(r#"{"emails": []}"#)
            .create_async()
            .await;

        let api = MailApi::new(&server.url(), "secret-token").unwrap();
        let emails = api.list_emails(Mailbox::Sent).await.unwrap();

        mock.assert_async().await;
        assert!(emails.is_empty());
    }

    #[tokio::test]
    async fn test_send_email_maps_non_2xx_to_server_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/mail/send")
            .with_status(500)
            .create_async()
            .await;

        let api = MailApi::new(&server.url(), "token").unwrap();
        let outgoing = OutgoingEmail {
            from: "alex@example.com".to_string(),
            to: vec!["pat@example.com".to_string()],
            subject: "Hello".to_string(),
            body: "Hi there".to_string(),
        };

        let result = api.send_email(&outgoing).await;
        match result {
            Err(SkiffError::Server(message)) => assert_eq!(message, "Failed to send email"),
            other => panic!("Expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_email_hits_id_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/mail/delete/e42")
            .with_status(200)
            .create_async()
            .await;

        let api = MailApi::new(&server.url(), "token").unwrap();
        api.delete_email("e42").await.unwrap();

        mock.assert_async().await;
    }
}
