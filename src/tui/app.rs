//! Application state and key handling for the TUI

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use flume::Sender;
use tracing::warn;

use crate::backend::MailApi;
use crate::config::AppConfig;
use crate::prefs::PrefStore;
use crate::services::onboarding;
use crate::store::{MailState, MailStore, MailStoreHandle};
use crate::types::error::Result;
use crate::types::{CustomFolder, Email, Mailbox};

use super::AppEvent;

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Onboarding,
    Mailbox,
}

/// Modal overlays on top of the mailbox screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Compose,
    NewFolder,
    MovePicker,
}

/// Focusable panes of the mailbox screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Sidebar,
    List,
}

/// The container whose emails the list pane shows
#[derive(Debug, Clone)]
pub enum Container {
    System(Mailbox),
    Custom(CustomFolder),
}

impl Container {
    pub fn title(&self) -> &str {
        match self {
            Container::System(mailbox) => mailbox.title(),
            Container::Custom(folder) => &folder.name,
        }
    }
}

/// Input fields of the onboarding form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingField {
    Name,
    Domain,
}

/// Input fields of the compose form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeField {
    To,
    Subject,
    Body,
}

pub struct App {
    config: AppConfig,
    prefs: PrefStore,
    events: Sender<AppEvent>,
    store: Option<MailStoreHandle>,

    pub should_quit: bool,
    pub screen: Screen,
    pub overlay: Overlay,
    pub focus: Pane,
    pub state: MailState,
    pub username: String,
    pub selected: Container,
    pub sidebar_index: usize,
    pub list_index: usize,

    // Onboarding form
    pub name_input: String,
    pub domain_input: String,
    pub onboarding_field: OnboardingField,
    pub onboarding_message: Option<String>,
    onboarding_username: Option<String>,

    // Compose form
    pub to_input: String,
    pub subject_input: String,
    pub body_input: String,
    pub compose_field: ComposeField,
    pub is_sending: bool,
    pub compose_error: Option<String>,

    // New-folder form
    pub folder_input: String,

    // Move-to-folder picker
    pub picker_index: usize,
}

impl App {
    pub fn new(config: AppConfig, prefs: PrefStore, events: Sender<AppEvent>) -> Result<Self> {
        let mut app = Self {
            config,
            prefs,
            events,
            store: None,
            should_quit: false,
            screen: Screen::Onboarding,
            overlay: Overlay::None,
            focus: Pane::Sidebar,
            state: MailState::default(),
            username: String::new(),
            selected: Container::System(Mailbox::Inbox),
            sidebar_index: 0,
            list_index: 0,
            name_input: String::new(),
            domain_input: "@example.com".to_string(),
            onboarding_field: OnboardingField::Name,
            onboarding_message: None,
            onboarding_username: None,
            to_input: String::new(),
            subject_input: String::new(),
            body_input: String::new(),
            compose_field: ComposeField::To,
            is_sending: false,
            compose_error: None,
            folder_input: String::new(),
            picker_index: 0,
        };

        if app.prefs.load().onboarding_complete {
            app.start_session()?;
        }

        Ok(app)
    }

    /// Build the API session, spawn the store, and enter the mailbox screen
    fn start_session(&mut self) -> Result<()> {
        let prefs_data = self.prefs.load();
        let api = MailApi::new(&self.config.api.base_url, &prefs_data.auth_token)?;
        let store = MailStore::spawn(api, self.prefs.clone());

        // Forward store publications into the event loop
        let mut watch = store.subscribe();
        let events = self.events.clone();
        tokio::spawn(async move {
            while watch.changed().await.is_ok() {
                if events.send(AppEvent::StateChanged).is_err() {
                    break;
                }
            }
        });

        self.state = store.snapshot();
        self.username = prefs_data.username;
        self.selected = Container::System(Mailbox::Inbox);
        self.sidebar_index = 0;
        self.list_index = 0;
        store.fetch_emails(Mailbox::Inbox);
        self.store = Some(store);
        self.screen = Screen::Mailbox;
        Ok(())
    }

    /// Pull the latest store snapshot and keep selections in bounds
    pub fn refresh_state(&mut self) {
        if let Some(store) = &self.store {
            self.state = store.snapshot();
        }
        if self.list_index >= self.state.emails.len() {
            self.list_index = self.state.emails.len().saturating_sub(1);
        }
        if self.sidebar_index >= self.sidebar_len() {
            self.sidebar_index = self.sidebar_len() - 1;
        }
        if self.picker_index >= self.state.folders.len() {
            self.picker_index = self.state.folders.len().saturating_sub(1);
        }
    }

    pub fn send_finished(&mut self, result: Result<()>) {
        self.is_sending = false;
        match result {
            Ok(()) => {
                self.overlay = Overlay::None;
                self.to_input.clear();
                self.subject_input.clear();
                self.body_input.clear();
                self.compose_error = None;
            }
            Err(e) => self.compose_error = Some(e.to_string()),
        }
    }

    /// Number of sidebar rows: the four system mailboxes plus custom folders
    pub fn sidebar_len(&self) -> usize {
        Mailbox::ALL.len() + self.state.folders.len()
    }

    pub fn current_email(&self) -> Option<&Email> {
        self.state.emails.get(self.list_index)
    }

    fn sidebar_container(&self) -> Container {
        if self.sidebar_index < Mailbox::ALL.len() {
            Container::System(Mailbox::ALL[self.sidebar_index])
        } else {
            let folder = self.state.folders[self.sidebar_index - Mailbox::ALL.len()].clone();
            Container::Custom(folder)
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        // A pending error owns the keyboard until acknowledged
        if self.screen == Screen::Mailbox && self.state.error.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                if let Some(store) = &self.store {
                    store.clear_error();
                }
            }
            return;
        }

        match self.screen {
            Screen::Onboarding => self.handle_onboarding_key(key),
            Screen::Mailbox => match self.overlay {
                Overlay::None => self.handle_mailbox_key(key),
                Overlay::Compose => self.handle_compose_key(key),
                Overlay::NewFolder => self.handle_new_folder_key(key),
                Overlay::MovePicker => self.handle_picker_key(key),
            },
        }
    }

    // Onboarding

    fn handle_onboarding_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                self.onboarding_field = match self.onboarding_field {
                    OnboardingField::Name => OnboardingField::Domain,
                    OnboardingField::Domain => OnboardingField::Name,
                };
            }
            KeyCode::Char(c) => {
                match self.onboarding_field {
                    OnboardingField::Name => self.name_input.push(c),
                    OnboardingField::Domain => self.domain_input.push(c),
                }
                self.validate_onboarding();
            }
            KeyCode::Backspace => {
                match self.onboarding_field {
                    OnboardingField::Name => self.name_input.pop(),
                    OnboardingField::Domain => self.domain_input.pop(),
                };
                self.validate_onboarding();
            }
            KeyCode::Enter => self.complete_onboarding(),
            _ => {}
        }
    }

    fn validate_onboarding(&mut self) {
        match onboarding::validate(&self.name_input, &self.domain_input) {
            Ok(username) => {
                self.onboarding_username = Some(username);
                self.onboarding_message = None;
            }
            Err(message) => {
                self.onboarding_username = None;
                self.onboarding_message = Some(message.to_string());
            }
        }
    }

    fn complete_onboarding(&mut self) {
        let Some(username) = self.onboarding_username.clone() else {
            return;
        };

        if let Err(e) = onboarding::complete(&self.prefs, &username) {
            self.onboarding_message = Some(e.to_string());
            return;
        }
        if let Err(e) = self.start_session() {
            self.onboarding_message = Some(e.to_string());
        }
    }

    // Mailbox screen

    fn handle_mailbox_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Pane::Sidebar => Pane::List,
                    Pane::List => Pane::Sidebar,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Enter => {
                if self.focus == Pane::Sidebar {
                    self.open_sidebar_selection();
                }
            }
            KeyCode::Char('c') => {
                self.compose_field = ComposeField::To;
                self.compose_error = None;
                self.overlay = Overlay::Compose;
            }
            KeyCode::Char('n') => {
                self.folder_input.clear();
                self.overlay = Overlay::NewFolder;
            }
            KeyCode::Char('d') => match self.focus {
                Pane::List => self.delete_current_email(),
                Pane::Sidebar => self.delete_selected_folder(),
            },
            KeyCode::Char('m') => {
                if self.focus == Pane::List && self.current_email().is_some() {
                    self.picker_index = 0;
                    self.overlay = Overlay::MovePicker;
                }
            }
            KeyCode::Char('s') => self.sign_out(),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = match self.focus {
            Pane::Sidebar => self.sidebar_len(),
            Pane::List => self.state.emails.len(),
        };
        if len == 0 {
            return;
        }
        let index = match self.focus {
            Pane::Sidebar => &mut self.sidebar_index,
            Pane::List => &mut self.list_index,
        };
        *index = index.saturating_add_signed(delta).min(len - 1);
    }

    fn open_sidebar_selection(&mut self) {
        self.selected = self.sidebar_container();
        self.list_index = 0;
        match &self.selected {
            Container::System(mailbox) => {
                if let Some(store) = &self.store {
                    store.fetch_emails(*mailbox);
                }
            }
            // Custom folders have no server-side contents to fetch
            Container::Custom(_) => {
                self.focus = Pane::List;
            }
        }
    }

    fn delete_current_email(&mut self) {
        let (Some(email), Some(store)) = (self.current_email().cloned(), self.store.clone())
        else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = store.delete_email(email).await {
                warn!("Failed to delete email: {}", e);
            }
        });
    }

    fn delete_selected_folder(&mut self) {
        if let (Container::Custom(folder), Some(store)) =
            (self.sidebar_container(), &self.store)
        {
            store.delete_folder(folder);
        }
    }

    fn sign_out(&mut self) {
        if let Some(store) = self.store.take() {
            store.sign_out();
        }
        self.screen = Screen::Onboarding;
        self.state = MailState::default();
        self.username.clear();
        self.name_input.clear();
        self.domain_input = "@example.com".to_string();
        self.onboarding_field = OnboardingField::Name;
        self.onboarding_message = None;
        self.onboarding_username = None;
    }

    // Compose overlay

    fn handle_compose_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            self.send_current_compose();
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.overlay = Overlay::None;
                self.compose_error = None;
            }
            KeyCode::Tab => {
                self.compose_field = match self.compose_field {
                    ComposeField::To => ComposeField::Subject,
                    ComposeField::Subject => ComposeField::Body,
                    ComposeField::Body => ComposeField::To,
                };
            }
            KeyCode::Enter => {
                if self.compose_field == ComposeField::Body {
                    self.body_input.push('\n');
                }
            }
            KeyCode::Char(c) => match self.compose_field {
                ComposeField::To => self.to_input.push(c),
                ComposeField::Subject => self.subject_input.push(c),
                ComposeField::Body => self.body_input.push(c),
            },
            KeyCode::Backspace => {
                match self.compose_field {
                    ComposeField::To => self.to_input.pop(),
                    ComposeField::Subject => self.subject_input.pop(),
                    ComposeField::Body => self.body_input.pop(),
                };
            }
            _ => {}
        }
    }

    /// Whether the send control is enabled
    pub fn can_send(&self) -> bool {
        !self.is_sending && !self.to_input.is_empty() && !self.subject_input.is_empty()
    }

    fn send_current_compose(&mut self) {
        if !self.can_send() {
            return;
        }
        let Some(store) = self.store.clone() else {
            return;
        };

        let recipients: Vec<String> = self
            .to_input
            .split(',')
            .map(|r| r.trim().to_string())
            .collect();
        let subject = self.subject_input.clone();
        let body = self.body_input.clone();

        self.is_sending = true;
        self.compose_error = None;

        let events = self.events.clone();
        tokio::spawn(async move {
            let result = store.send_email(recipients, subject, body).await;
            let _ = events.send(AppEvent::SendFinished(result));
        });
    }

    // New-folder overlay

    fn handle_new_folder_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.overlay = Overlay::None,
            KeyCode::Enter => {
                if !self.folder_input.is_empty() {
                    if let Some(store) = &self.store {
                        store.create_folder(self.folder_input.clone());
                    }
                    self.overlay = Overlay::None;
                }
            }
            KeyCode::Char(c) => self.folder_input.push(c),
            KeyCode::Backspace => {
                self.folder_input.pop();
            }
            _ => {}
        }
    }

    // Move-to-folder picker

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.overlay = Overlay::None,
            KeyCode::Up | KeyCode::Char('k') => {
                self.picker_index = self.picker_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.state.folders.is_empty() {
                    self.picker_index = (self.picker_index + 1).min(self.state.folders.len() - 1);
                }
            }
            KeyCode::Enter => {
                let email = self.current_email().cloned();
                let folder = self.state.folders.get(self.picker_index).cloned();
                if let (Some(email), Some(folder), Some(store)) = (email, folder, &self.store) {
                    store.move_email(email, folder);
                }
                self.overlay = Overlay::None;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PrefStore::at_path(dir.path().join("prefs.json"));
        let (events, _rx) = flume::unbounded();
        App::new(AppConfig::default(), prefs, events).unwrap()
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_fresh_app_starts_on_onboarding() {
        let app = test_app();
        assert_eq!(app.screen, Screen::Onboarding);
        assert_eq!(app.domain_input, "@example.com");
    }

    #[test]
    fn test_onboarding_validates_as_the_user_types() {
        let mut app = test_app();

        type_text(&mut app, "alex");
        assert!(app.onboarding_message.is_none());

        // Reserved name
        for _ in 0..4 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Admin");
        assert_eq!(
            app.onboarding_message.as_deref(),
            Some(onboarding::NAME_UNAVAILABLE)
        );

        // Dot-less domain
        for _ in 0..5 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "alex");
        press(&mut app, KeyCode::Tab);
        for _ in 0..".com".len() {
            press(&mut app, KeyCode::Backspace);
        }
        assert_eq!(
            app.onboarding_message.as_deref(),
            Some(onboarding::INVALID_INPUT)
        );
    }

    #[test]
    fn test_compose_send_gating_requires_recipients_and_subject() {
        let mut app = test_app();
        assert!(!app.can_send());

        app.to_input = "pat@example.com".to_string();
        assert!(!app.can_send());

        app.subject_input = "Hello".to_string();
        assert!(app.can_send());

        app.is_sending = true;
        assert!(!app.can_send());
    }
}
