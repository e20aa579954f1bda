use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, PendingAction, Tab};

use super::screens::{forms, products, profile};
use super::styles;

const LOGO: [&str; 3] = [
    "╔╦╗╔═╗╦═╗╦╔═╔═╗╔╦╗╔╗ ╔═╗╔═╗╦╔═",
    "║║║╠═╣╠╦╝╠╩╗║╣  ║ ╠╩╗║ ║║ ║╠╩╗",
    "╩ ╩╩ ╩╩╚═╩ ╩╚═╝ ╩ ╚═╝╚═╝╚═╝╩ ╩",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::SigningIn => forms::render_sign_in(frame, app),
        AppState::SigningUp => forms::render_sign_up(frame, app),
        AppState::EditingProfile => forms::render_profile(frame, app),
        AppState::Filtering => products::render_filter_dialog(frame, app),
        AppState::ViewingProduct => products::render_detail_overlay(frame, app),
        AppState::ConfirmingSignOut => render_confirm_overlay(
            frame,
            "Do you really want to sign out?",
            app.pending_action == Some(PendingAction::SignOut),
        ),
        AppState::ConfirmingQuit => {
            render_confirm_overlay(frame, "Are you sure you want to quit?", false)
        }
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

/// The logo lines, centered in a box of the given interior width
pub fn logo_lines(width: u16) -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| {
            let pad = (width as usize).saturating_sub(row.chars().count()) / 2;
            Line::from(Span::styled(
                format!("{}{}", " ".repeat(pad), row),
                styles::title_style(),
            ))
        })
        .collect()
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Marketbook";
    let right = match app.seller {
        Some(ref seller) => format!("{}  [?] Help", seller.greeting()),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [
        ("[1] ", Tab::Products),
        ("[2] ", Tab::Profile),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (key, tab)) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(
            format!("{}{}", key, tab.title()),
            styles::tab_style(app.current_tab == *tab),
        ));
    }

    if app.current_tab == Tab::Products && !app.criteria.is_empty() {
        spans.push(Span::styled("   (filters active)", styles::highlight_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if app.seller.is_none() {
        // Nothing to show behind the sign-in overlay
        return;
    }
    match app.current_tab {
        Tab::Products => products::render(frame, app, area),
        Tab::Profile => profile::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match (app.seller.is_some(), app.current_tab) {
        (false, _) => "[q]uit",
        (true, Tab::Products) => "[/] search | [f]ilter | [u]pdate | [q]uit",
        (true, Tab::Profile) => "[e]dit | [s]ign out | [q]uit",
    };

    let (left_text, left_style) = if app.is_busy() {
        (" Please wait... ".to_string(), styles::highlight_style())
    } else if let Some(ref msg) = app.status_message {
        (format!(" {} ", msg.text), styles::status_style(msg.kind))
    } else if app.loading_products {
        (" Loading products... ".to_string(), styles::muted_style())
    } else {
        (String::new(), styles::muted_style())
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(description, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 25, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines(50);
    help_text.extend([
        Line::from(Span::styled(
            format!("{:^50}", format!("version {}", version)),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-2", "Switch tabs"),
        help_line("←/→", "Prev/next tab"),
        help_line("↑/↓", "Navigate list"),
        help_line("Enter", "Open product"),
        help_line("Esc", "Go back"),
        Line::from(""),
        Line::from(Span::styled(" Products", styles::highlight_style())),
        help_line("/", "Search title and description"),
        help_line("f", "Filter by price and category"),
        help_line("u", "Reload products"),
        help_line("c", "Contact the seller (product view)"),
        Line::from(""),
        Line::from(Span::styled(" Profile", styles::highlight_style())),
        help_line("e", "Edit profile"),
        help_line("s", "Sign out"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, busy: bool) {
    let area = centered_rect_fixed(46, 10, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines(44);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{:^44}", question),
        styles::highlight_style(),
    )));
    lines.push(Line::from(""));
    if busy {
        lines.push(Line::from(Span::styled(
            format!("{:^44}", "Please wait..."),
            styles::muted_style(),
        )));
    } else {
        lines.push(Line::from(vec![
            Span::styled("      Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to confirm, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect_fixed(46, 10, area);
        assert_eq!(rect, Rect::new(27, 15, 46, 10));

        let small = Rect::new(0, 0, 30, 5);
        let rect = centered_rect_fixed(46, 10, small);
        assert_eq!(rect, Rect::new(0, 0, 30, 5));
    }

    #[test]
    fn test_logo_is_centered() {
        let lines = logo_lines(50);
        assert_eq!(lines.len(), 3);
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(first.starts_with("          ╔"));
    }
}
