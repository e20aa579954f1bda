use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Profile ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let Some(ref seller) = app.seller else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {:<8}", label), styles::highlight_style()),
            Span::raw(value),
        ])
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", seller.name), styles::title_style())),
        Line::from(""),
        field("Email", seller.email.clone()),
        field("Phone", seller.phone_display()),
        field(
            "Photo",
            seller
                .avatar_url()
                .map(str::to_string)
                .unwrap_or_else(|| "No photo".to_string()),
        ),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [e]", styles::help_key_style()),
            Span::styled(" edit profile   ", styles::muted_style()),
            Span::styled("[s]", styles::help_key_style()),
            Span::styled(" sign out", styles::muted_style()),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
