use std::io;

use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::app::App;
use crate::models::{EntityView, MoveView, Stat};
use crate::nav::Route;
use crate::sprite::{SpriteThumb, SPRITE_H, SPRITE_W};
use crate::state::Phase;
use crate::utils::{format_name, text_to_lines};

/// Width of one catalog grid cell, marker included.
const CELL_W: usize = 18;

pub fn draw_ui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    terminal.draw(|f| render(f, app)).map(|_| ())
}

fn render<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(size);

    draw_header(f, chunks[0], app);
    let route = app.route().clone();
    match route {
        Route::Catalog { .. } => draw_catalog(f, chunks[1], app),
        Route::Entity { .. } => draw_entity(f, chunks[1], app),
        Route::Move { .. } => draw_move(f, chunks[1], app),
    }
    draw_footer(f, chunks[2], app);

    if app.show_help {
        draw_help(f, size);
    }
}

fn draw_header<B: Backend>(f: &mut Frame<B>, area: Rect, app: &App) {
    let line = Spans::from(vec![
        Span::styled(
            "Pokédex Browser",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {}  ", app.route().title())),
        Span::styled(app.route().to_string(), Style::default().fg(Color::Gray)),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_footer<B: Backend>(f: &mut Frame<B>, area: Rect, app: &App) {
    let footer = if let Some(input) = &app.prompt {
        let mut spans = vec![Span::raw(format!("/{input}"))];
        if let Some(error) = &app.prompt_error {
            spans.push(Span::styled(
                format!("  {error}"),
                Style::default().fg(Color::Red),
            ));
        }
        Paragraph::new(Spans::from(spans))
            .block(Block::default().borders(Borders::ALL).title("Go to"))
    } else {
        let hints = match app.route() {
            Route::Catalog { .. } => "arrows select · Enter open · n/p page · / go to · h help · q quit",
            Route::Entity { .. } => "Up/Down moves · Enter move details · a ancestor · q quit",
            Route::Move { .. } => "r reload · / go to · q quit",
        };
        let back = if app.history.depth() > 0 { " · b back" } else { "" };
        Paragraph::new(Spans::from(Span::styled(
            format!("{hints}{back}"),
            Style::default().fg(Color::DarkGray),
        )))
        .block(Block::default().borders(Borders::ALL))
    };
    f.render_widget(footer, area);
}

fn draw_loading<B: Backend>(f: &mut Frame<B>, area: Rect, title: &str) {
    let para = Paragraph::new("Loading…")
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(para, area);
}

fn draw_not_found<B: Backend>(f: &mut Frame<B>, area: Rect, title: &str) {
    let lines = vec![
        Spans::from(Span::styled(
            "404",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Spans::from(Span::raw("This page could not be found.")),
        Spans::from(Span::raw("")),
        Spans::from(Span::raw("Press b to go back.")),
    ];
    let para = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(para, area);
}

fn draw_catalog<B: Backend>(f: &mut Frame<B>, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let body = if app.show_sprites {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(CELL_W as u16 + 2),
                Constraint::Length(SPRITE_W as u16 + 2),
            ])
            .split(chunks[1])
    } else {
        Layout::default()
            .constraints([Constraint::Min(3)])
            .split(chunks[1])
    };
    let grid_rect = body[0];
    app.grid_columns = (grid_rect.width.saturating_sub(2) as usize / CELL_W).max(1);

    let page = match app.catalog.phase() {
        Phase::Success(page) => page,
        Phase::Error(message) => {
            draw_pager(f, chunks[0], app);
            let para = Paragraph::new(Spans::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )))
            .block(Block::default().borders(Borders::ALL).title("Pokémon"));
            f.render_widget(para, chunks[1]);
            return;
        }
        Phase::NotFound => {
            draw_not_found(f, area, "Pokémon");
            return;
        }
        Phase::Idle | Phase::Loading => {
            draw_loading(f, area, "Pokémon");
            return;
        }
    };

    draw_pager(f, chunks[0], app);

    let cols = app.grid_columns;
    let visible_rows = grid_rect.height.saturating_sub(2).max(1) as usize;
    let selected_row = app.selected / cols;
    let first_row = (selected_row + 1).saturating_sub(visible_rows);
    let thumbs = app.thumbnails.success();

    let mut grid: Vec<Spans> = Vec::new();
    for (row, chunk) in page.results.chunks(cols).enumerate().skip(first_row) {
        let mut cells: Vec<Span> = Vec::new();
        for (col, entry) in chunk.iter().enumerate() {
            let index = row * cols + col;
            let has_sprite = thumbs
                .and_then(|t| t.get(&entry.name))
                .map_or(false, |s| !s.is_empty());
            let marker = if has_sprite { "● " } else { "  " };
            let label: String = format_name(&entry.name).chars().take(CELL_W - 3).collect();
            let cell = format!("{marker}{label:<width$} ", width = CELL_W - 3);
            let style = if index == app.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            cells.push(Span::styled(cell, style));
        }
        grid.push(Spans::from(cells));
    }

    let grid_para =
        Paragraph::new(grid).block(Block::default().borders(Borders::ALL).title("Pokémon"));
    f.render_widget(grid_para, grid_rect);

    if app.show_sprites {
        let title = app
            .selected_entry()
            .map(format_name)
            .unwrap_or_else(|| "Sprite".to_string());
        draw_sprite(f, body[1], app, &title);
    }
}

/// Prev/Next and the page status. Page count is left out until a page has loaded.
fn draw_pager<B: Backend>(f: &mut Frame<B>, area: Rect, app: &App) {
    let pager = app.pager();
    let enabled = Style::default().add_modifier(Modifier::BOLD);
    let disabled = Style::default().fg(Color::DarkGray);
    let mut status = vec![
        Span::styled(
            "[p] Prev",
            if pager.can_go_prev() { enabled } else { disabled },
        ),
        Span::raw(format!("  {}  ", pager.status_line())),
        Span::styled(
            "[n] Next",
            if pager.can_go_next() { enabled } else { disabled },
        ),
    ];
    if app.thumbnails.is_loading() {
        status.push(Span::styled(
            "  Loading sprites…",
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Spans::from(status)), area);
}

fn draw_sprite<B: Backend>(f: &mut Frame<B>, area: Rect, app: &App, title: &str) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let para = match app.sprite.phase() {
        Phase::Success(thumb) => Paragraph::new(sprite_lines(thumb)),
        Phase::Loading => Paragraph::new("Loading sprite…"),
        _ => Paragraph::new("(no sprite)"),
    };
    f.render_widget(para.block(block), area);
}

fn sprite_lines(thumb: &SpriteThumb) -> Vec<Spans<'static>> {
    thumb
        .rows()
        .map(|row| {
            Spans::from(
                row.iter()
                    .map(|pixel| match pixel {
                        Some((r, g, b)) => {
                            Span::styled(" ", Style::default().bg(Color::Rgb(*r, *g, *b)))
                        }
                        None => Span::raw(" "),
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

fn draw_entity<B: Backend>(f: &mut Frame<B>, area: Rect, app: &App) {
    let view = match app.entity.phase() {
        Phase::Success(view) => view,
        Phase::NotFound | Phase::Error(_) => return draw_not_found(f, area, "Pokémon"),
        Phase::Idle | Phase::Loading => return draw_loading(f, area, "Pokémon"),
    };

    let top_h = (SPRITE_H as u16 + 2).min(area.height / 2).max(6);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(top_h), Constraint::Min(6)])
        .split(area);

    let top = if app.show_sprites {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(SPRITE_W as u16 + 2),
                Constraint::Min(10),
            ])
            .split(chunks[0])
    } else {
        Layout::default()
            .constraints([Constraint::Min(10)])
            .split(chunks[0])
    };
    let info_rect = if app.show_sprites {
        draw_sprite(f, top[0], app, "Sprite");
        top[1]
    } else {
        top[0]
    };

    let width = info_rect.width.saturating_sub(2).max(10) as usize;
    let info = Paragraph::new(entity_info_lines(view, width))
        .block(Block::default().borders(Borders::ALL).title("Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(info, info_rect);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(10)])
        .split(chunks[1]);

    let stats = Paragraph::new(stat_lines(&view.stats, bottom[0].width))
        .block(Block::default().borders(Borders::ALL).title("Base Stats"));
    f.render_widget(stats, bottom[0]);

    let items: Vec<ListItem> = view
        .moves
        .iter()
        .map(|mv| ListItem::new(Spans::from(Span::raw(mv.clone()))))
        .collect();
    let moves = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Moves (Enter for details)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !view.moves.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(moves, bottom[1], &mut state);
}

fn entity_info_lines(view: &EntityView, width: usize) -> Vec<Spans<'static>> {
    let mut lines = vec![Spans::from(Span::styled(
        format_name(&view.name),
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    let mut type_spans = vec![Span::raw(format!("{}: ", view.types_label()))];
    for (i, t) in view.types.iter().enumerate() {
        if i > 0 {
            type_spans.push(Span::raw(" "));
        }
        type_spans.push(type_badge(t));
    }
    lines.push(Spans::from(type_spans));

    if let Some(ancestor) = &view.ancestor {
        lines.push(Spans::from(vec![
            Span::raw("Evolves from: "),
            Span::styled(
                format_name(ancestor),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ),
            Span::styled("  [a]", Style::default().fg(Color::DarkGray)),
        ]));
    }

    lines.push(Spans::from(Span::raw("")));
    lines.push(Spans::from(Span::styled(
        "Description",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in text_to_lines(&view.description, width) {
        lines.push(Spans::from(Span::raw(line)));
    }
    lines
}

fn type_badge(name: &str) -> Span<'static> {
    let (r, g, b) = match name.to_lowercase().as_str() {
        "normal" => (168, 168, 120),
        "fire" => (240, 128, 48),
        "water" => (104, 144, 240),
        "grass" => (120, 200, 80),
        "electric" => (248, 208, 48),
        "ice" => (152, 216, 216),
        "fighting" => (192, 48, 40),
        "poison" => (160, 64, 160),
        "ground" => (224, 192, 104),
        "flying" => (168, 144, 240),
        "psychic" => (248, 88, 136),
        "bug" => (168, 184, 32),
        "rock" => (184, 160, 56),
        "ghost" => (112, 88, 152),
        "dragon" => (112, 56, 248),
        "dark" => (112, 88, 72),
        "steel" => (184, 184, 208),
        "fairy" => (238, 153, 172),
        _ => (200, 200, 200),
    };
    // pick black or white text for contrast
    let lum = 0.2126 * (r as f32) + 0.7152 * (g as f32) + 0.0722 * (b as f32);
    let fg = if lum > 160.0 { Color::Black } else { Color::White };
    Span::styled(
        format!(" {} ", format_name(name)),
        Style::default().fg(fg).bg(Color::Rgb(r, g, b)),
    )
}

fn stat_label(name: &str) -> String {
    match name {
        "hp" => "HP".to_string(),
        "attack" => "ATK".to_string(),
        "defense" => "DEF".to_string(),
        "special-attack" => "SpA".to_string(),
        "special-defense" => "SpD".to_string(),
        "speed" => "SPD".to_string(),
        other => format_name(other),
    }
}

/// One row per stat, in upstream order: `NAME  VALUE  bar`.
fn stat_lines(stats: &[Stat], rect_width: u16) -> Vec<Spans<'static>> {
    const NAME_W: usize = 8;
    const VAL_W: usize = 4;
    let inner_w = rect_width.saturating_sub(2) as usize;
    let bar_max_w = inner_w.saturating_sub(NAME_W + VAL_W + 2);

    stats
        .iter()
        .map(|st| {
            let bar_len = ((st.base.min(255) as f32 / 255.0) * bar_max_w as f32).round() as usize;
            Spans::from(Span::raw(format!(
                "{:<name_w$} {:>val_w$} {}",
                stat_label(&st.name),
                st.base,
                "█".repeat(bar_len),
                name_w = NAME_W,
                val_w = VAL_W
            )))
        })
        .collect()
}

fn draw_move<B: Backend>(f: &mut Frame<B>, area: Rect, app: &App) {
    match app.move_detail.phase() {
        Phase::Success(view) => {
            let para = Paragraph::new(move_lines(view))
                .block(Block::default().borders(Borders::ALL).title("Move"))
                .wrap(Wrap { trim: false });
            f.render_widget(para, area);
        }
        Phase::NotFound | Phase::Error(_) => draw_not_found(f, area, "Move"),
        Phase::Idle | Phase::Loading => draw_loading(f, area, "Move"),
    }
}

fn move_lines(view: &MoveView) -> Vec<Spans<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Spans::from(Span::styled(format_name(&view.name), bold)),
        Spans::from(vec![
            Span::styled("Type: ", bold),
            Span::raw(format_name_or_missing(view.type_text())),
        ]),
        Spans::from(vec![
            Span::styled("Category: ", bold),
            Span::raw(format_name_or_missing(view.category_text())),
        ]),
        Spans::from(Span::raw("")),
    ];

    if let Some(flavor) = &view.flavor {
        lines.push(Spans::from(Span::styled("Flavor", bold)));
        for line in flavor.lines() {
            lines.push(Spans::from(Span::raw(line.to_string())));
        }
        lines.push(Spans::from(Span::raw("")));
    }

    lines.push(Spans::from(Span::styled("Base Stats", bold)));
    for (label, value) in view.stat_rows() {
        lines.push(Spans::from(vec![
            Span::styled(format!("{:<10}", format!("{label}:")), bold),
            Span::raw(value.to_string()),
        ]));
    }
    lines
}

fn format_name_or_missing(value: &str) -> String {
    let formatted = format_name(value);
    if formatted.is_empty() {
        value.to_string()
    } else {
        formatted
    }
}

fn draw_help<B: Backend>(f: &mut Frame<B>, area: Rect) {
    // helper to compute a centered rect for popups
    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_w = r.width.saturating_mul(percent_x) / 100;
        let popup_h = r.height.saturating_mul(percent_y) / 100;
        let popup_x = r.x + (r.width.saturating_sub(popup_w) / 2);
        let popup_y = r.y + (r.height.saturating_sub(popup_h) / 2);
        Rect::new(popup_x, popup_y, popup_w, popup_h)
    }

    let popup = centered_rect(60, 60, area);
    let mut help_lines: Vec<Spans> = vec![
        Spans::from(Span::styled(
            "Keybindings",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Spans::from(Span::raw("")),
    ];
    for line in [
        "q          Quit",
        "h / F1     Toggle this help",
        "arrows     Move the selection",
        "Enter      Open the selected Pokémon or move",
        "n / PgDn   Next page",
        "p / PgUp   Previous page",
        "a          Open the Pokémon this one evolves from",
        "b / Esc    Go back",
        "r          Reload the current view",
        "/          Go to a route or Pokémon name",
    ] {
        help_lines.push(Spans::from(Span::raw(line)));
    }

    let help_para = Paragraph::new(help_lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, popup);
    f.render_widget(help_para, popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppEvent;
    use crate::models::{CatalogEntry, CatalogPage, Entity, Move, Species};
    use crate::state::PageError;
    use ratatui::backend::TestBackend;

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        draw_ui(&mut terminal, app).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn line_with<'a>(screen: &'a str, needle: &str) -> &'a str {
        screen.lines().find(|l| l.contains(needle)).unwrap_or("")
    }

    #[test]
    fn catalog_error_keeps_the_shell() {
        let mut app = App::new(Route::Catalog { offset: 50 }, true);
        app.enter();
        app.handle(AppEvent::CatalogDidLoad {
            offset: 50,
            outcome: Err(PageError::Failed("Failed to fetch Pokédex".into())),
        });
        let text = screen(&mut app);
        assert!(text.contains("Pokédex Browser"));
        assert!(text.contains("Failed to fetch Pokédex"));
        assert!(text.contains("q quit"));

        let status = line_with(&text, "Page 2");
        assert!(status.contains("[p] Prev"));
        assert!(status.contains("Showing 50 (indices 50–99)"));
        assert!(!status.contains(" / "));
        assert_eq!(app.pager().prev(), Some(0));
        assert_eq!(app.pager().next(), None);
    }

    #[test]
    fn catalog_grid_and_status() {
        let mut app = App::new(Route::Catalog { offset: 50 }, true);
        app.enter();
        app.handle(AppEvent::CatalogDidLoad {
            offset: 50,
            outcome: Ok(CatalogPage {
                total_count: 1302,
                results: ["chikorita", "mr-mime"]
                    .iter()
                    .map(|n| CatalogEntry {
                        name: n.to_string(),
                        url: String::new(),
                    })
                    .collect(),
            }),
        });
        let text = screen(&mut app);
        assert!(text.contains("Page 2 / 27 · Showing 50 (indices 50–99)"));
        assert!(text.contains("Loading sprites…"));
        assert!(text.contains("Chikorita"));
        assert!(text.contains("Mr Mime"));
        assert!(app.grid_columns > 1);
    }

    #[test]
    fn entity_not_found_view() {
        let mut app = App::new(Route::Entity { name: String::new() }, true);
        app.enter();
        let text = screen(&mut app);
        assert!(text.contains("This page could not be found."));
    }

    #[test]
    fn entity_view_shows_ancestor_only_when_present() {
        let mut app = App::new(Route::Entity { name: "raichu".into() }, false);
        app.enter();
        app.handle(AppEvent::EntityDidLoad {
            name: "raichu".into(),
            outcome: Ok(EntityView::new(
                Entity {
                    name: "raichu".into(),
                    types: vec!["electric".into()],
                    stats: vec![Stat { name: "speed".into(), base: 110 }],
                    moves: vec!["thunderbolt".into()],
                    ..Entity::default()
                },
                Species {
                    evolves_from: Some("pikachu".into()),
                    ..Species::default()
                },
            )),
        });
        let text = screen(&mut app);
        assert!(text.contains("Evolves from: Pikachu"));
        assert!(line_with(&text, "Type:").contains("Electric"));
        assert!(line_with(&text, "SPD").contains("110"));
        assert!(text.contains("> thunderbolt"));

        let mut root = App::new(Route::Entity { name: "pichu".into() }, false);
        root.enter();
        root.handle(AppEvent::EntityDidLoad {
            name: "pichu".into(),
            outcome: Ok(EntityView::new(Entity::default(), Species::default())),
        });
        let text = screen(&mut root);
        assert!(!text.contains("Evolves from"));
        assert!(text.contains("No description available."));
    }

    #[test]
    fn move_view_placeholders_and_zero() {
        let mut app = App::new(Route::Move { name: "counter".into() }, true);
        app.enter();
        app.handle(AppEvent::MoveDidLoad {
            name: "counter".into(),
            outcome: Ok(MoveView::new(Move {
                name: "counter".into(),
                power: Some("0".into()),
                ..Move::default()
            })),
        });
        let text = screen(&mut app);
        assert!(line_with(&text, "Power:").contains('0'));
        assert!(line_with(&text, "Accuracy:").contains('—'));
        assert!(line_with(&text, "Type:").contains('—'));
        assert!(!text.contains("Flavor"));
    }
}
