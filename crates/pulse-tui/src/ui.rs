use chrono::Local;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use pulse_core::{Entry, HistoryView, InputField, NotificationLevel, Role, UiContext};
use crate::app::{App, FocusPane};
use crate::handler::DELETE_BUTTON_WIDTH;
use crate::markup::fragment_to_lines;
use crate::palette::Palette;

/// The input box grows with its content up to this many lines.
const MAX_INPUT_LINES: u16 = 6;
const HISTORY_WIDTH: u16 = 36;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.client.ui().theme);

    frame.render_widget(Block::default().style(Style::default().bg(palette.bg)), area);

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, &palette, frame, header_area);

    let main_area = if app.client.history().is_open() {
        let [history_area, main_area] =
            Layout::horizontal([Constraint::Length(HISTORY_WIDTH), Constraint::Min(0)])
                .areas(body_area);
        render_history(app, &palette, frame, history_area);
        main_area
    } else {
        app.history_area = None;
        body_area
    };

    let input_lines = (app.client.ui().input.line_count() as u16).clamp(1, MAX_INPUT_LINES);
    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_lines + 2),
    ])
    .areas(main_area);

    render_transcript(app, &palette, frame, transcript_area);
    render_input(app, &palette, frame, input_area);
    render_footer(app, &palette, frame, footer_area);

    // Popups
    if let Some(title) = app.confirm_delete.clone() {
        render_confirm_delete(&title, &palette, frame, area);
    } else if app.show_help {
        render_help(&palette, frame, area);
    }
}

fn render_header(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" PulseAI ", Style::default().fg(palette.accent).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(palette.muted),
        ),
        Span::raw("  "),
        Span::styled(
            format!("[{}]", app.client.ui().theme.as_str()),
            Style::default().fg(palette.muted),
        ),
    ];
    if app.client.session().is_sending() {
        spans.push(Span::styled(
            "  ● waiting for reply",
            Style::default().fg(palette.assistant),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.bar_bg));
    frame.render_widget(header, area);
}

fn render_history(app: &mut App, palette: &Palette, frame: &mut Frame, area: Rect) {
    app.history_area = Some(area);

    let focused = app.focus == FocusPane::History;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { palette.accent } else { palette.border }))
        .title(" Chats ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let history = app.client.history();
    let rows = match history.view() {
        HistoryView::Unloaded => {
            app.history_offset = 0;
            let loading = Paragraph::new("Loading...").style(Style::default().fg(palette.muted));
            frame.render_widget(loading, inner);
            return;
        }
        HistoryView::Empty => {
            app.history_offset = 0;
            let empty = Paragraph::new("No chats yet")
                .style(Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC));
            frame.render_widget(empty, inner);
            return;
        }
        HistoryView::Rows(rows) => rows,
    };

    // Keep the selection in view
    let visible = usize::from(inner.height.max(1));
    let selected = history.selected();
    let offset = selected.saturating_sub(visible - 1);
    let today = Local::now().date_naive();
    let label_width = usize::from(inner.width.saturating_sub(DELETE_BUTTON_WIDTH));

    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, chat)| {
            let marker = if chat.is_current { "● " } else { "  " };
            let age = chat.age_label(today);
            let title_width = label_width.saturating_sub(age.chars().count() + 3);
            let label = format!(
                "{marker}{:<title_width$} {age}",
                truncate(&chat.title, title_width)
            );
            let label = truncate(&label, label_width);

            let row_style = if i == selected && focused {
                Style::default().bg(palette.accent).fg(palette.bg)
            } else if chat.is_current {
                Style::default().fg(palette.accent)
            } else {
                Style::default().fg(palette.fg)
            };
            Line::from(vec![
                Span::styled(format!("{label:<label_width$}"), row_style),
                Span::styled(" ✕ ", Style::default().fg(palette.error)),
            ])
        })
        .collect();

    app.history_offset = offset;
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Lines for every transcript entry, in order.
pub fn transcript_lines(ui: &UiContext, palette: &Palette, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for entry in ui.transcript.entries() {
        match entry {
            Entry::Message(message) => {
                let (label, color) = match message.role() {
                    Role::User => ("You:", palette.user),
                    Role::Assistant => ("Pulse:", palette.assistant),
                };
                lines.push(Line::from(Span::styled(label, palette.role(color))));
                lines.extend(fragment_to_lines(message.html(), palette));
                lines.push(Line::default());
            }
            Entry::Typing => {
                lines.push(Line::from(Span::styled("Pulse:", palette.role(palette.assistant))));
                // Animated ellipsis: ".", "..", "..."
                let dots = ".".repeat(usize::from(animation_frame) + 1);
                lines.push(Line::from(Span::styled(
                    format!("typing{dots}"),
                    Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }

    lines
}

/// Rows `paragraph` takes up once word-wrapped to `width` columns. Call it
/// before a block is attached, or the borders are counted too.
pub fn rendered_height(paragraph: &Paragraph<'_>, width: u16) -> u16 {
    paragraph
        .line_count(width.max(1))
        .min(usize::from(u16::MAX)) as u16
}

fn render_transcript(app: &mut App, palette: &Palette, frame: &mut Frame, area: Rect) {
    app.transcript_area = Some(area);

    let focused = app.focus == FocusPane::Transcript;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { palette.accent } else { palette.border }));
    let inner = block.inner(area);

    let ui = app.client.ui();
    if ui.show_welcome && ui.transcript.entries().next().is_none() {
        let welcome = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                "Welcome to PulseAI",
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Type a message below and press Enter to start.",
                Style::default().fg(palette.muted),
            )),
        ]);
        let welcome = Paragraph::new(welcome)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(welcome, area);
        return;
    }

    let transcript = Paragraph::new(transcript_lines(ui, palette, app.animation_frame))
        .wrap(Wrap { trim: false });
    let content_height = rendered_height(&transcript, inner.width);
    let scroll = app
        .client
        .ui_mut()
        .transcript
        .resolve_scroll(content_height, inner.height);

    frame.render_widget(transcript.block(block).scroll((scroll, 0)), area);
}

/// Row and column of the cursor inside the input text.
fn cursor_position(input: &InputField) -> (u16, u16) {
    let before: String = input.text().chars().take(input.cursor()).collect();
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count());
    (row as u16, col as u16)
}

fn render_input(app: &mut App, palette: &Palette, frame: &mut Frame, area: Rect) {
    app.input_area = Some(area);

    let ui = app.client.ui();
    let focused = app.focus == FocusPane::Input;
    let send_hint = if ui.send_button.enabled {
        Span::styled(" Enter ↵ send ", Style::default().fg(palette.accent))
    } else {
        Span::styled(" sending... Esc cancel ", Style::default().fg(palette.muted))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { palette.user } else { palette.border }))
        .title(" Message ")
        .title(Line::from(send_hint).alignment(Alignment::Right));
    let inner = block.inner(area);

    // Keep the cursor visible in both directions
    let (row, col) = cursor_position(&ui.input);
    let scroll_y = row.saturating_sub(inner.height.saturating_sub(1));
    let scroll_x = col.saturating_sub(inner.width.saturating_sub(1));

    let input = Paragraph::new(ui.input.text().to_string())
        .style(Style::default().fg(palette.user))
        .scroll((scroll_y, scroll_x))
        .block(block);
    frame.render_widget(input, area);

    if focused && app.confirm_delete.is_none() && !app.show_help {
        frame.set_cursor_position((
            inner.x + col - scroll_x,
            inner.y + row - scroll_y,
        ));
    }
}

fn render_footer(app: &App, palette: &Palette, frame: &mut Frame, area: Rect) {
    if let Some(notification) = app.client.ui().notification() {
        let color = match notification.level {
            NotificationLevel::Error => palette.error,
            NotificationLevel::Info => palette.accent,
        };
        let bar = Paragraph::new(format!(" {} ", notification.message))
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD));
        frame.render_widget(bar, area);
        return;
    }

    let key_style = Style::default().bg(palette.bar_bg).fg(palette.fg);
    let label_style = Style::default().fg(palette.muted);

    let mut hints = match app.focus {
        FocusPane::Input => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Alt+Enter ", key_style),
            Span::styled(" newline ", label_style),
        ],
        FocusPane::Transcript => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" G ", key_style),
            Span::styled(" bottom ", label_style),
        ],
        FocusPane::History => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" open ", label_style),
            Span::styled(" d ", key_style),
            Span::styled(" delete ", label_style),
        ],
    };
    hints.extend(vec![
        Span::styled(" Tab ", key_style),
        Span::styled(" focus ", label_style),
        Span::styled(" ^O ", key_style),
        Span::styled(" chats ", label_style),
        Span::styled(" ^N ", key_style),
        Span::styled(" new ", label_style),
        Span::styled(" ^T ", key_style),
        Span::styled(" theme ", label_style),
        Span::styled(" F1 ", key_style),
        Span::styled(" help ", label_style),
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height);
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

fn render_confirm_delete(title: &str, palette: &Palette, frame: &mut Frame, area: Rect) {
    let popup_area = centered(area, 50, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.error))
        .title(" Delete chat ");

    let text = Text::from(vec![
        Line::from(format!("Delete \"{}\"?", truncate(title, 40))),
        Line::default(),
        Line::from(vec![
            Span::styled(" y ", Style::default().bg(palette.error).fg(palette.bg)),
            Span::raw(" delete   "),
            Span::styled(" n ", Style::default().bg(palette.bar_bg).fg(palette.fg)),
            Span::raw(" keep"),
        ]),
    ]);
    let popup = Paragraph::new(text)
        .style(Style::default().fg(palette.fg).bg(palette.bg))
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(popup, popup_area);
}

fn render_help(palette: &Palette, frame: &mut Frame, area: Rect) {
    const KEYS: &[(&str, &str)] = &[
        ("Enter", "send message"),
        ("Alt/Shift+Enter", "insert newline"),
        ("Esc", "cancel a pending reply"),
        ("Tab", "cycle focus"),
        ("PgUp/PgDn", "scroll transcript"),
        ("Ctrl+O", "show or hide chat history"),
        ("Ctrl+N", "start a new chat"),
        ("Ctrl+T", "toggle light/dark theme"),
        ("Ctrl+C", "quit"),
    ];

    let popup_area = centered(area, 46, KEYS.len() as u16 + 4);
    frame.render_widget(Clear, popup_area);

    let mut lines: Vec<Line> = KEYS
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!(" {key:<16}"), Style::default().fg(palette.accent).bold()),
                Span::styled(*what, Style::default().fg(palette.fg)),
            ])
        })
        .collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        " Press any key to close",
        Style::default().fg(palette.muted),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(" Keys ");
    let help = Paragraph::new(lines)
        .style(Style::default().bg(palette.bg))
        .block(block);
    frame.render_widget(help, popup_area);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
