use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use marketbook_core::utils::truncate;
use marketbook_core::Product;

use crate::app::{App, AppState, FilterFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_search_bar(frame, app, rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    render_product_list(frame, app, columns[0]);
    render_preview(frame, app, columns[1]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.state == AppState::Searching;
    let content = if app.search_query.is_empty() && !searching {
        Line::from(Span::styled(
            "Search for a product (press /)",
            styles::muted_style(),
        ))
    } else {
        let cursor = if searching { "▌" } else { "" };
        Line::from(vec![
            Span::styled(app.search_query.clone(), styles::search_style()),
            Span::styled(cursor, styles::search_style()),
        ])
    };

    let block = Block::default()
        .title(" Search ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_product_list(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible_products();
    let locale = app.products.locale();
    let title_width = (area.width as usize).saturating_sub(20).max(10);

    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .map(|(i, product)| {
            let line = Line::from(vec![
                Span::raw(format!(
                    "{:<width$}",
                    truncate(&product.title, title_width),
                    width = title_width
                )),
                Span::styled(
                    format!(" {:>16}", product.price_display(locale)),
                    styles::price_style(),
                ),
            ]);

            let style = if i == app.product_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = if app.products.products().len() == visible.len() {
        format!(" Products ({}) ", visible.len())
    } else {
        format!(
            " Products ({} of {}) ",
            visible.len(),
            app.products.products().len()
        )
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.state == AppState::Normal));

    if items.is_empty() {
        let message = if app.loading_products {
            "Loading products..."
        } else {
            "No products found"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(message, styles::muted_style())))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(items).block(block);
    let mut state = ListState::default();
    state.select(Some(app.product_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

fn product_lines(app: &App, product: &Product) -> Vec<Line<'static>> {
    let locale = app.products.locale();
    let mut lines = vec![
        Line::from(Span::styled(product.title.clone(), styles::title_style())),
        Line::from(Span::styled(
            product.price_display(locale),
            styles::price_style(),
        )),
        Line::from(""),
        Line::from(product.description.clone()),
        Line::from(""),
        Line::from(vec![
            Span::styled("Category: ", styles::highlight_style()),
            Span::raw(product.category.title.clone()),
        ]),
        Line::from(vec![
            Span::styled("Status:   ", styles::highlight_style()),
            Span::raw(product.status.clone()),
        ]),
        Line::from(vec![
            Span::styled("Seller:   ", styles::highlight_style()),
            Span::raw(product.owner.name.clone()),
        ]),
    ];
    if let Some(url) = product.cover_url() {
        lines.push(Line::from(vec![
            Span::styled("Photo:    ", styles::highlight_style()),
            Span::styled(url.to_string(), styles::muted_style()),
        ]));
    }
    lines
}

fn render_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let lines = match app.selected_product() {
        Some(product) => {
            let mut lines = product_lines(app, product);
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Press Enter for views and contact",
                styles::muted_style(),
            )));
            lines
        }
        None => vec![Line::from(Span::styled(
            "Select a product",
            styles::muted_style(),
        ))],
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Full product view with the seven-day view count
pub fn render_detail_overlay(frame: &mut Frame, app: &App) {
    let Some(ref detail) = app.product_detail else {
        return;
    };

    let area = centered_rect_fixed(64, 20, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = product_lines(app, &detail.product);
    lines.push(Line::from(""));
    let views = match (detail.views, detail.loading) {
        (Some(views), _) => Span::styled(
            format!("{} views in the last 7 days", views),
            styles::success_style(),
        ),
        (None, true) => Span::styled("Loading views...", styles::muted_style()),
        (None, false) => Span::styled("Views unavailable", styles::muted_style()),
    };
    lines.push(Line::from(views));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[c]", styles::help_key_style()),
        Span::styled(" contact seller   ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" back", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(" Product ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn bound_line(label: &str, value: &str, focused: bool, symbol: &str) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(format!("  {:<12}", label), styles::muted_style()),
        Span::styled(format!("{} [", symbol), styles::muted_style()),
        Span::styled(format!("{:>14}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

pub fn render_filter_dialog(frame: &mut Frame, app: &App) {
    let height = (app.categories.len() as u16 + 12).min(24);
    let area = centered_rect_fixed(48, height, frame.area());
    frame.render_widget(Clear, area);

    let draft = &app.filter_draft;
    let symbol = &app.products.locale().currency_symbol;

    let mut lines = vec![
        Line::from(Span::styled(" Price", styles::highlight_style())),
        bound_line(
            "Minimum",
            &draft.min_price,
            app.filter_focus == FilterFocus::MinPrice,
            symbol,
        ),
        bound_line(
            "Maximum",
            &draft.max_price,
            app.filter_focus == FilterFocus::MaxPrice,
            symbol,
        ),
        Line::from(""),
        Line::from(Span::styled(" Categories", styles::highlight_style())),
    ];

    if app.categories.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No categories loaded",
            styles::muted_style(),
        )));
    }
    let categories_focused = app.filter_focus == FilterFocus::Categories;
    for (i, category) in app.categories.iter().enumerate() {
        let mark = if draft.has_category(&category.slug) { "[x]" } else { "[ ]" };
        let style = if categories_focused && i == app.category_selection {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(Span::styled(
            format!("  {} {}", mark, category.title),
            style,
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [Tab]", styles::help_key_style()),
        Span::styled(" next  ", styles::muted_style()),
        Span::styled("[Space]", styles::help_key_style()),
        Span::styled(" toggle  ", styles::muted_style()),
        Span::styled("[r]", styles::help_key_style()),
        Span::styled(" reset", styles::muted_style()),
    ]));
    lines.push(Line::from(vec![
        Span::styled(" [Enter]", styles::help_key_style()),
        Span::styled(" apply filters  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(" Filter ads ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
