//! Screen renderers
//!
//! Pure functions from app state to widgets; no input handling here.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::types::Mailbox;

use super::app::{App, ComposeField, OnboardingField, Overlay, Pane, Screen};

pub fn render(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Onboarding => render_onboarding(frame, app),
        Screen::Mailbox => {
            render_mailbox(frame, app);
            match app.overlay {
                Overlay::Compose => render_compose(frame, app),
                Overlay::NewFolder => render_new_folder(frame, app),
                Overlay::MovePicker => render_move_picker(frame, app),
                Overlay::None => {}
            }
            if let Some(error) = &app.state.error {
                render_error_popup(frame, error);
            }
        }
    }
}

fn render_onboarding(frame: &mut Frame, app: &App) {
    let area = centered_rect(54, 14, frame.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Welcome to Your Mail App");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new("Pick a name and domain to get started.")
            .style(Style::default().fg(Color::DarkGray)),
        rows[0],
    );
    frame.render_widget(
        input_field(
            "Name",
            &app.name_input,
            app.onboarding_field == OnboardingField::Name,
        ),
        rows[1],
    );
    frame.render_widget(
        input_field(
            "Domain",
            &app.domain_input,
            app.onboarding_field == OnboardingField::Domain,
        ),
        rows[2],
    );

    if let Some(message) = &app.onboarding_message {
        frame.render_widget(
            Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
            rows[3],
        );
    }
    frame.render_widget(hint_line("enter continue · tab switch field · esc quit"), rows[4]);
}

fn render_mailbox(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)])
        .split(chunks[0]);

    render_sidebar(frame, app, panes[0]);
    render_email_list(frame, app, panes[1]);
    frame.render_widget(
        hint_line(
            "q quit · tab focus · ↑↓ select · enter open · c compose · n new folder · d delete · m move · s sign out",
        ),
        chunks[1],
    );
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);

    let mut items: Vec<ListItem> = Vec::new();
    items.push(ListItem::new(Span::styled("Mailboxes", header_style)));
    for mailbox in Mailbox::ALL {
        items.push(ListItem::new(format!(
            " {} {}",
            mailbox.glyph(),
            mailbox.title()
        )));
    }
    items.push(ListItem::new(Span::styled("Folders", header_style)));
    for folder in &app.state.folders {
        items.push(ListItem::new(format!(" 📁 {}", folder.name)));
    }

    // Selection index skips the two section header rows
    let display_row = if app.sidebar_index < Mailbox::ALL.len() {
        app.sidebar_index + 1
    } else {
        app.sidebar_index + 2
    };
    let mut list_state = ListState::default();
    list_state.select(Some(display_row));

    let focused = app.focus == Pane::Sidebar && app.overlay == Overlay::None;
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Welcome, {}", app.username))
                .border_style(pane_style(focused)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_email_list(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.state.loading {
        format!("{} — loading…", app.selected.title())
    } else {
        app.selected.title().to_string()
    };
    let focused = app.focus == Pane::List && app.overlay == Overlay::None;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(pane_style(focused));

    if app.state.emails.is_empty() {
        frame.render_widget(
            Paragraph::new("No emails")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .state
        .emails
        .iter()
        .map(|email| {
            let sender_style = if email.is_read {
                Style::default()
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let header = Line::from(vec![
                Span::styled(email.sender.clone(), sender_style),
                Span::raw("  "),
                Span::styled(
                    email.date.format("%b %d, %Y").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            let subject = Line::from(email.subject.clone());
            let preview = Line::from(Span::styled(
                email.preview.clone(),
                Style::default().fg(Color::DarkGray),
            ));
            ListItem::new(vec![header, subject, preview])
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(app.list_index));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_compose(frame: &mut Frame, app: &App) {
    let area = centered_rect(64, 18, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default().borders(Borders::ALL).title("New Email");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        input_field("To", &app.to_input, app.compose_field == ComposeField::To),
        rows[0],
    );
    frame.render_widget(
        input_field(
            "Subject",
            &app.subject_input,
            app.compose_field == ComposeField::Subject,
        ),
        rows[1],
    );
    frame.render_widget(
        Paragraph::new(app.body_input.as_str())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Body")
                    .border_style(pane_style(app.compose_field == ComposeField::Body)),
            ),
        rows[2],
    );

    if app.is_sending {
        frame.render_widget(
            Paragraph::new("Sending…").style(Style::default().fg(Color::Yellow)),
            rows[3],
        );
    } else if let Some(error) = &app.compose_error {
        frame.render_widget(
            Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
            rows[3],
        );
    }
    frame.render_widget(hint_line("ctrl+s send · tab next field · esc cancel"), rows[4]);
}

fn render_new_folder(frame: &mut Frame, app: &App) {
    let area = centered_rect(44, 7, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default().borders(Borders::ALL).title("New Folder");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(inner);

    frame.render_widget(input_field("Folder Name", &app.folder_input, true), rows[0]);
    frame.render_widget(hint_line("enter create · esc cancel"), rows[1]);
}

fn render_move_picker(frame: &mut Frame, app: &App) {
    let area = centered_rect(44, 12, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Move to Folder");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    if app.state.folders.is_empty() {
        frame.render_widget(
            Paragraph::new("No folders yet").style(Style::default().fg(Color::DarkGray)),
            rows[0],
        );
    } else {
        let items: Vec<ListItem> = app
            .state
            .folders
            .iter()
            .map(|folder| ListItem::new(format!(" 📁 {}", folder.name)))
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(app.picker_index));

        let list =
            List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        frame.render_stateful_widget(list, rows[0], &mut list_state);
    }

    frame.render_widget(hint_line("enter move · esc cancel"), rows[1]);
}

fn render_error_popup(frame: &mut Frame, error: &str) {
    let area = centered_rect(50, 7, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Error")
        .border_style(Style::default().fg(Color::Red));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    frame.render_widget(Paragraph::new(error).wrap(Wrap { trim: true }), rows[0]);
    frame.render_widget(hint_line("enter dismiss"), rows[1]);
}

fn input_field<'a>(title: &'a str, value: &'a str, active: bool) -> Paragraph<'a> {
    Paragraph::new(value).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(pane_style(active)),
    )
}

fn pane_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn hint_line(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}
