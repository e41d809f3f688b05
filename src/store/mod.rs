//! Mail state store
//!
//! Single source of truth for mailbox contents and custom folders. The
//! store runs as a single-writer task that owns the state: views send
//! commands through a channel, network calls run as spawned tasks, and
//! their completions are marshaled back onto the store task as internal
//! commands before any state is touched. Mutations are therefore
//! serialized, but two independently issued operations may still complete
//! and apply in either order — notably, a second fetch issued while one is
//! in flight can land first and be overwritten by the earlier fetch's
//! result. That race is long-standing observed behavior and is left as-is;
//! do not add cancellation or sequencing here.
//!
//! Published state is a [`tokio::sync::watch`] channel: subscribers always
//! observe the latest snapshot and never mutate it.

use flume::{Receiver, Sender};
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::MailApi;
use crate::prefs::PrefStore;
use crate::types::error::{Result, SkiffError};
use crate::types::{CustomFolder, Email, Mailbox, OutgoingEmail};

/// Published mail state
///
/// `emails` holds the most recently fetched mailbox in server order;
/// `folders` the user's custom folders in creation order. `loading` is true
/// only while a fetch is outstanding, and `error` is set only immediately
/// after a failed operation, until the user acknowledges it.
#[derive(Debug, Clone, Default)]
pub struct MailState {
    pub emails: Vec<Email>,
    pub folders: Vec<CustomFolder>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Commands processed by the store task
///
/// `FetchCompleted` and `DeleteApplied` are internal: they carry the result
/// of a spawned network call back onto the store task.
enum Command {
    FetchEmails(Mailbox),
    FetchCompleted(Result<Vec<Email>>),
    SendEmail {
        to: Vec<String>,
        subject: String,
        body: String,
        reply: oneshot::Sender<Result<()>>,
    },
    DeleteEmail {
        email: Email,
        reply: oneshot::Sender<Result<()>>,
    },
    DeleteApplied {
        id: String,
    },
    MoveEmail {
        email: Email,
        folder: CustomFolder,
    },
    CreateFolder {
        name: String,
    },
    DeleteFolder {
        folder: CustomFolder,
    },
    ClearError,
    SignOut,
}

/// Handle for dispatching commands to the store and observing its state
#[derive(Clone)]
pub struct MailStoreHandle {
    commands: Sender<Command>,
    published: watch::Receiver<MailState>,
}

impl MailStoreHandle {
    /// Subscribe to published state
    pub fn subscribe(&self) -> watch::Receiver<MailState> {
        self.published.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> MailState {
        self.published.borrow().clone()
    }

    /// Fetch the contents of a mailbox, replacing the email collection
    pub fn fetch_emails(&self, mailbox: Mailbox) {
        let _ = self.commands.send(Command::FetchEmails(mailbox));
    }

    /// Send an email; resolves once the server has accepted or rejected it
    pub async fn send_email(&self, to: Vec<String>, subject: String, body: String) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::SendEmail {
                to,
                subject,
                body,
                reply,
            })
            .map_err(|_| SkiffError::NotAuthenticated)?;
        response.await.map_err(|_| SkiffError::NotAuthenticated)?
    }

    /// Delete an email on the server, removing it locally on success
    pub async fn delete_email(&self, email: Email) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::DeleteEmail { email, reply })
            .map_err(|_| SkiffError::NotAuthenticated)?;
        response.await.map_err(|_| SkiffError::NotAuthenticated)?
    }

    /// Move an email to a custom folder
    pub fn move_email(&self, email: Email, folder: CustomFolder) {
        let _ = self.commands.send(Command::MoveEmail { email, folder });
    }

    /// Create a custom folder and persist the folder list
    pub fn create_folder(&self, name: String) {
        let _ = self.commands.send(Command::CreateFolder { name });
    }

    /// Delete a custom folder and persist the folder list
    pub fn delete_folder(&self, folder: CustomFolder) {
        let _ = self.commands.send(Command::DeleteFolder { folder });
    }

    /// Acknowledge and clear the current error message
    pub fn clear_error(&self) {
        let _ = self.commands.send(Command::ClearError);
    }

    /// Clear credentials and state, and drop the API session
    pub fn sign_out(&self) {
        let _ = self.commands.send(Command::SignOut);
    }
}

/// The store task itself
pub struct MailStore {
    session: Option<MailApi>,
    prefs: PrefStore,
    username: String,
    state: MailState,
    published: watch::Sender<MailState>,
    commands: Sender<Command>,
}

impl MailStore {
    /// Spawn the store task and return a handle to it
    ///
    /// The username and custom folder list are loaded from the preference
    /// store up front.
    pub fn spawn(api: MailApi, prefs: PrefStore) -> MailStoreHandle {
        let initial = prefs.load();
        let state = MailState {
            folders: initial.custom_folders,
            ..MailState::default()
        };

        let (published, subscriber) = watch::channel(state.clone());
        let (commands, inbox) = flume::unbounded();

        let store = MailStore {
            session: Some(api),
            prefs,
            username: initial.username,
            state,
            published,
            commands: commands.clone(),
        };
        tokio::spawn(store.run(inbox));

        MailStoreHandle {
            commands,
            published: subscriber,
        }
    }

    async fn run(mut self, inbox: Receiver<Command>) {
        while let Ok(command) = inbox.recv_async().await {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::FetchEmails(mailbox) => self.fetch_emails(mailbox),
            Command::FetchCompleted(result) => self.apply_fetch(result),
            Command::SendEmail {
                to,
                subject,
                body,
                reply,
            } => self.send_email(to, subject, body, reply),
            Command::DeleteEmail { email, reply } => self.delete_email(email, reply),
            Command::DeleteApplied { id } => self.apply_delete(id),
            Command::MoveEmail { email, folder } => self.move_email(email, folder),
            Command::CreateFolder { name } => self.create_folder(name),
            Command::DeleteFolder { folder } => self.delete_folder(folder),
            Command::ClearError => {
                self.state.error = None;
                self.publish();
            }
            Command::SignOut => self.sign_out(),
        }
    }

    fn fetch_emails(&mut self, mailbox: Mailbox) {
        self.state.loading = true;
        self.publish();

        match &self.session {
            Some(api) => {
                let api = api.clone();
                let commands = self.commands.clone();
                tokio::spawn(async move {
                    let result = api.list_emails(mailbox).await;
                    let _ = commands.send(Command::FetchCompleted(result));
                });
            }
            None => {
                let _ = self
                    .commands
                    .send(Command::FetchCompleted(Err(SkiffError::NotAuthenticated)));
            }
        }
    }

    fn apply_fetch(&mut self, result: Result<Vec<Email>>) {
        match result {
            Ok(emails) => {
                info!("Fetched {} email(s)", emails.len());
                self.state.emails = emails;
            }
            Err(e) => {
                warn!("Fetch failed: {}", e);
                self.state.error = Some(e.to_string());
            }
        }
        self.state.loading = false;
        self.publish();
    }

    fn send_email(
        &mut self,
        to: Vec<String>,
        subject: String,
        body: String,
        reply: oneshot::Sender<Result<()>>,
    ) {
        match &self.session {
            Some(api) => {
                let api = api.clone();
                let outgoing = OutgoingEmail {
                    from: self.username.clone(),
                    to,
                    subject,
                    body,
                };
                tokio::spawn(async move {
                    let _ = reply.send(api.send_email(&outgoing).await);
                });
            }
            None => {
                let _ = reply.send(Err(SkiffError::NotAuthenticated));
            }
        }
    }

    fn delete_email(&mut self, email: Email, reply: oneshot::Sender<Result<()>>) {
        match &self.session {
            Some(api) => {
                let api = api.clone();
                let commands = self.commands.clone();
                tokio::spawn(async move {
                    match api.delete_email(&email.id).await {
                        Ok(()) => {
                            // Local removal only after the server confirmed
                            let _ = commands.send(Command::DeleteApplied { id: email.id });
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            warn!("Delete failed: {}", e);
                            let _ = reply.send(Err(e));
                        }
                    }
                });
            }
            None => {
                let _ = reply.send(Err(SkiffError::NotAuthenticated));
            }
        }
    }

    fn apply_delete(&mut self, id: String) {
        self.state.emails.retain(|e| e.id != id);
        self.publish();
    }

    /// Remove the email from the local collection
    ///
    /// No request is issued and nothing is persisted; the email is not
    /// re-associated with the target folder anywhere. Long-standing
    /// behavior, kept as-is.
    fn move_email(&mut self, email: Email, folder: CustomFolder) {
        info!("Moving email {} to folder {}", email.id, folder.name);
        self.state.emails.retain(|e| e.id != email.id);
        self.publish();
    }

    fn create_folder(&mut self, name: String) {
        info!("Creating folder: {}", name);
        let folder = CustomFolder {
            id: Uuid::new_v4().to_string(),
            name,
        };
        self.state.folders.push(folder);
        self.persist_folders();
        self.publish();
    }

    fn delete_folder(&mut self, folder: CustomFolder) {
        info!("Deleting folder: {}", folder.name);
        self.state.folders.retain(|f| f.id != folder.id);
        self.persist_folders();
        self.publish();
    }

    fn sign_out(&mut self) {
        info!("Signing out");

        let mut prefs = self.prefs.load();
        prefs.auth_token.clear();
        prefs.username.clear();
        prefs.onboarding_complete = false;
        if let Err(e) = self.prefs.save(&prefs) {
            warn!("Failed to clear credentials: {}", e);
        }

        self.username.clear();
        self.state.emails.clear();
        self.state.folders.clear();
        self.session = None;
        self.publish();
    }

    /// Write the in-memory folder list through to the preference store
    ///
    /// Load-modify-save so concurrent writers of other keys are not
    /// clobbered more than last-writer-wins already allows.
    fn persist_folders(&self) {
        let mut prefs = self.prefs.load();
        prefs.custom_folders = self.state.folders.clone();
        if let Err(e) = self.prefs.save(&prefs) {
            warn!("Failed to persist folders: {}", e);
        }
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_email(id: &str) -> Email {
        Email {
            id: id.to_string(),
            subject: format!("Subject {}", id),
            sender: "someone@example.com".to_string(),
            preview: "Preview of the email content...".to_string(),
            date: Utc::now(),
            is_read: false,
        }
    }

    fn inbox_body(ids: &[&str]) -> String {
        let emails: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"id": "{}", "subject": "Subject {}", "sender": "someone@example.com",
                        "preview": "...", "date": "2024-05-01T09:00:00Z", "isRead": false}}"#,
                    id, id
                )
            })
            .collect();
        format!(r#"{{"emails": [{}]}}"#, emails.join(","))
    }

    fn store_with(server_url: &str, dir: &TempDir) -> (MailStoreHandle, PrefStore) {
        let prefs = PrefStore::at_path(dir.path().join("prefs.json"));
        let api = MailApi::new(server_url, "token").unwrap();
        (MailStore::spawn(api, prefs.clone()), prefs)
    }

    #[tokio::test]
    async fn test_fetch_replaces_collection_in_server_order() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/mail/inbox")
            .with_status(200)
            .with_body(inbox_body(&["e3", "e1", "e2"]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handle, _) = store_with(&server.url(), &dir);
        let mut state = handle.subscribe();

        handle.fetch_emails(Mailbox::Inbox);
        let snapshot = state
            .wait_for(|s| !s.loading && s.emails.len() == 3)
            .await
            .unwrap()
            .clone();

        let ids: Vec<&str> = snapshot.emails.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e3", "e1", "e2"]);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_collection_and_sets_error() {
        let mut server = mockito::Server::new_async().await;
        let _inbox_mock = server
            .mock("GET", "/mail/inbox")
            .with_status(200)
            .with_body(inbox_body(&["e1", "e2"]))
            .create_async()
            .await;
        let _sent_mock = server
            .mock("GET", "/mail/sent")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handle, _) = store_with(&server.url(), &dir);
        let mut state = handle.subscribe();

        handle.fetch_emails(Mailbox::Inbox);
        state
            .wait_for(|s| s.emails.len() == 2)
            .await
            .unwrap();

        handle.fetch_emails(Mailbox::Sent);
        let snapshot = state
            .wait_for(|s| s.error.is_some())
            .await
            .unwrap()
            .clone();

        assert!(!snapshot.loading);
        assert!(!snapshot.error.unwrap().is_empty());
        // The previous collection is untouched by the failure
        assert_eq!(snapshot.emails.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one_on_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/mail/inbox")
            .with_status(200)
            .with_body(inbox_body(&["e1", "e2"]))
            .create_async()
            .await;
        let delete_mock = server
            .mock("DELETE", "/mail/delete/e1")
            .with_status(200)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handle, _) = store_with(&server.url(), &dir);
        let mut state = handle.subscribe();

        handle.fetch_emails(Mailbox::Inbox);
        state.wait_for(|s| s.emails.len() == 2).await.unwrap();

        handle.delete_email(sample_email("e1")).await.unwrap();
        let snapshot = state
            .wait_for(|s| s.emails.len() == 1)
            .await
            .unwrap()
            .clone();

        delete_mock.assert_async().await;
        assert_eq!(snapshot.emails[0].id, "e2");
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_collection_unchanged() {
        let mut server = mockito::Server::new_async().await;
        let _inbox_mock = server
            .mock("GET", "/mail/inbox")
            .with_status(200)
            .with_body(inbox_body(&["e1", "e2"]))
            .create_async()
            .await;
        let _delete_mock = server
            .mock("DELETE", "/mail/delete/e1")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handle, _) = store_with(&server.url(), &dir);
        let mut state = handle.subscribe();

        handle.fetch_emails(Mailbox::Inbox);
        state.wait_for(|s| s.emails.len() == 2).await.unwrap();

        let result = handle.delete_email(sample_email("e1")).await;
        assert!(matches!(result, Err(SkiffError::Server(_))));
        assert_eq!(handle.snapshot().emails.len(), 2);
    }

    #[tokio::test]
    async fn test_move_email_removes_locally_without_network() {
        // Only the list endpoint is mocked; a move that issued any request
        // would have nothing to talk to and could not remove the email.
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/mail/inbox")
            .with_status(200)
            .with_body(inbox_body(&["e1", "e2"]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handle, prefs) = store_with(&server.url(), &dir);
        let mut state = handle.subscribe();

        handle.fetch_emails(Mailbox::Inbox);
        state.wait_for(|s| s.emails.len() == 2).await.unwrap();

        let folder = CustomFolder {
            id: "folder-1".to_string(),
            name: "Receipts".to_string(),
        };
        handle.move_email(sample_email("e1"), folder);
        let snapshot = state
            .wait_for(|s| s.emails.len() == 1)
            .await
            .unwrap()
            .clone();

        assert_eq!(snapshot.emails[0].id, "e2");
        // Nothing about the move is persisted either
        assert!(prefs.load().custom_folders.is_empty());
    }

    #[tokio::test]
    async fn test_create_folder_persists_for_fresh_load() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let (handle, prefs) = store_with(&server.url(), &dir);
        let mut state = handle.subscribe();

        handle.create_folder("Receipts".to_string());
        let snapshot = state
            .wait_for(|s| s.folders.len() == 1)
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.folders[0].name, "Receipts");

        // A fresh store reconstructs the same folder list from disk
        let api = MailApi::new(&server.url(), "token").unwrap();
        let fresh = MailStore::spawn(api, prefs);
        let folders = fresh.snapshot().folders;
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Receipts");
    }

    #[tokio::test]
    async fn test_delete_folder_updates_persisted_list() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let (handle, prefs) = store_with(&server.url(), &dir);
        let mut state = handle.subscribe();

        handle.create_folder("Receipts".to_string());
        handle.create_folder("Travel".to_string());
        let snapshot = state
            .wait_for(|s| s.folders.len() == 2)
            .await
            .unwrap()
            .clone();

        handle.delete_folder(snapshot.folders[0].clone());
        state.wait_for(|s| s.folders.len() == 1).await.unwrap();

        let persisted = prefs.load().custom_folders;
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].name, "Travel");
    }

    #[tokio::test]
    async fn test_clear_error_acknowledges_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/mail/inbox")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (handle, _) = store_with(&server.url(), &dir);
        let mut state = handle.subscribe();

        handle.fetch_emails(Mailbox::Inbox);
        state.wait_for(|s| s.error.is_some()).await.unwrap();

        handle.clear_error();
        state.wait_for(|s| s.error.is_none()).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_out_clears_state_and_session() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/mail/inbox")
            .with_status(200)
            .with_body(inbox_body(&["e1"]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let prefs = PrefStore::at_path(dir.path().join("prefs.json"));
        let mut initial = prefs.load();
        initial.auth_token = "token".to_string();
        initial.username = "alex@example.com".to_string();
        initial.onboarding_complete = true;
        prefs.save(&initial).unwrap();

        let api = MailApi::new(&server.url(), "token").unwrap();
        let handle = MailStore::spawn(api, prefs.clone());
        let mut state = handle.subscribe();

        handle.create_folder("Receipts".to_string());
        handle.fetch_emails(Mailbox::Inbox);
        state
            .wait_for(|s| s.emails.len() == 1 && s.folders.len() == 1)
            .await
            .unwrap();

        handle.sign_out();
        state
            .wait_for(|s| s.emails.is_empty() && s.folders.is_empty())
            .await
            .unwrap();

        // Credentials and the onboarding flag are gone from disk
        let cleared = prefs.load();
        assert_eq!(cleared.auth_token, "");
        assert_eq!(cleared.username, "");
        assert!(!cleared.onboarding_complete);

        // The session is dropped, so further operations refuse to run
        handle.fetch_emails(Mailbox::Inbox);
        let snapshot = state.wait_for(|s| s.error.is_some()).await.unwrap().clone();
        assert_eq!(
            snapshot.error.unwrap(),
            SkiffError::NotAuthenticated.to_string()
        );
    }
}
