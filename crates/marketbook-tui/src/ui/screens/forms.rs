//! Sign-in, sign-up and profile edit overlays.

use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::form::FormState;
use crate::ui::render::{centered_rect_fixed, logo_lines};
use crate::ui::styles;

/// Width of the visible part of an input
const INPUT_WIDTH: usize = 24;

/// Interior width of a form dialog
const DIALOG_WIDTH: u16 = 56;

/// Show the end of long values so the cursor stays visible
fn visible_tail(value: &str) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(INPUT_WIDTH)).collect()
}

fn form_lines(form: &FormState, button: &str, busy: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for &field in form.fields() {
        let focused = form.focused() == Some(field);
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };

        let value = form.value(field);
        let shown = if field.is_secret() {
            "*".repeat(value.chars().count().min(INPUT_WIDTH))
        } else {
            visible_tail(value)
        };
        let cursor = if focused { "▌" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(format!(" {:>20}: [", field.label()), styles::muted_style()),
            Span::styled(
                format!("{:<width$}{}", shown, cursor, width = INPUT_WIDTH),
                style,
            ),
            Span::styled("]", styles::muted_style()),
        ]));

        if let Some(error) = form.error(field) {
            lines.push(Line::from(Span::styled(
                format!("{:>23}{}", "", error),
                styles::error_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    let label = if busy {
        " Please wait... ".to_string()
    } else if form.is_button_focused() {
        format!(" ▶ {} ◀ ", button)
    } else {
        format!("   {}   ", button)
    };
    let style = if form.is_button_focused() {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let pad = (DIALOG_WIDTH as usize).saturating_sub(label.chars().count() + 2) / 2;
    lines.push(Line::from(vec![
        Span::raw(format!("{}[", " ".repeat(pad))),
        Span::styled(label, style),
        Span::raw("]"),
    ]));

    lines
}

fn render_dialog(frame: &mut Frame, title: &str, mut lines: Vec<Line<'static>>) {
    lines.insert(0, Line::from(""));
    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(DIALOG_WIDTH + 2, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn hint(keys: &'static str, text: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {}", keys), styles::help_key_style()),
        Span::styled(text, styles::muted_style()),
    ])
}

pub fn render_sign_in(frame: &mut Frame, app: &App) {
    let mut lines = logo_lines(DIALOG_WIDTH);
    lines.push(Line::from(""));
    lines.extend(form_lines(&app.sign_in_form, "Sign in", app.is_busy()));
    lines.push(Line::from(""));
    lines.push(hint("[Ctrl+N]", " create an account   [Esc] quit"));
    render_dialog(frame, "Welcome", lines);
}

pub fn render_sign_up(frame: &mut Frame, app: &App) {
    let mut lines = form_lines(&app.sign_up_form, "Register", app.is_busy());
    lines.push(Line::from(""));
    lines.push(hint("[Esc]", " back to sign in"));
    render_dialog(frame, "Create your account", lines);
}

pub fn render_profile(frame: &mut Frame, app: &App) {
    let mut lines = vec![Line::from(Span::styled(
        " Leave the password fields empty to keep your password.",
        styles::muted_style(),
    ))];
    lines.push(Line::from(""));
    lines.extend(form_lines(&app.profile_form, "Save", app.is_busy()));
    lines.push(Line::from(""));
    lines.push(hint("[Esc]", " cancel"));
    render_dialog(frame, "Edit profile", lines);
}
