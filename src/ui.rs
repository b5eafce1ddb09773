use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, InputMode};
use crate::conversation::Role;
use crate::model::AiModel;
use crate::orchestrator::GenerationClient;
use crate::prompt::Persona;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut current_text = String::new();

    while let Some((_, c)) = chars.next() {
        if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some((_, c)) = chars.next() {
                if c == '*' && chars.peek().map(|(_, c)| *c) == Some('*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render<C: GenerationClient>(app: &mut App<C>, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header<C: GenerationClient>(app: &App<C>, frame: &mut Frame, area: Rect) {
    let context_indicator = if app.context_enabled { " [page]" } else { "" };
    let persona_indicator = match app.persona {
        Persona::General => "",
        Persona::SlangAware => " [KE]",
        Persona::LocalLens => " [lens]",
    };

    let title = Line::from(vec![
        Span::styled(" Zenith AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {}", app.active_model.display_name()),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("{context_indicator}{persona_indicator}"),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat<C: GenerationClient>(app: &mut App<C>, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Conversation ");
    let inner = block.inner(area);

    // Record geometry for scroll/wrap math
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    if app.orchestrator.messages().is_empty() && !app.orchestrator.is_generating() {
        let welcome = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(
                "Zenith AI Orchestrator",
                Style::default().fg(Color::Cyan).bold(),
            )),
            Line::default(),
            Line::from("Unified bridge between browser data and next-gen AI."),
            Line::from("Ask about the current page or anything else."),
            Line::default(),
            Line::from(Span::styled(
                "Try: \"Summarize this page\" or \"Explain the key concepts\"",
                Style::default().fg(Color::Gray),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: false })
        .centered();
        frame.render_widget(welcome, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.orchestrator.messages() {
        let timestamp = msg.timestamp.format("%H:%M").to_string();
        let role_line = match msg.role {
            Role::User => Line::from(vec![
                Span::styled("You", Style::default().fg(Color::Green).bold()),
                Span::styled(format!("  {timestamp}"), Style::default().fg(Color::Gray)),
            ]),
            Role::Assistant => {
                let tag = msg
                    .model
                    .map(|m| m.display_name())
                    .unwrap_or("Zenith");
                Line::from(vec![
                    Span::styled(tag, Style::default().fg(Color::Magenta).bold()),
                    Span::styled(format!("  {timestamp}"), Style::default().fg(Color::Gray)),
                ])
            }
        };
        lines.push(role_line);

        for content_line in msg.content.lines() {
            match msg.role {
                Role::User => lines.push(Line::from(content_line.to_string())),
                Role::Assistant => lines.push(parse_markdown_line(content_line)),
            }
        }
        lines.push(Line::default());
    }

    if app.orchestrator.is_generating() {
        let dots = ".".repeat((app.animation_frame + 1) as usize);
        lines.push(Line::from(Span::styled(
            format!("Zenith is analyzing{dots}"),
            Style::default().fg(Color::Cyan).italic(),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_input<C: GenerationClient>(app: &App<C>, frame: &mut Frame, area: Rect) {
    let border_style = match app.input_mode {
        InputMode::Editing => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default(),
    };

    let title = if app.orchestrator.is_generating() {
        " Ask Zenith (generating, Esc to cancel) "
    } else {
        " Ask Zenith anything "
    };

    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing {
        // Cursor sits after the border, offset by the char cursor position.
        let x = area.x + 1 + app.cursor.min(area.width.saturating_sub(2) as usize) as u16;
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_footer<C: GenerationClient>(app: &App<C>, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" chat keys ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" M ", key_style),
            Span::styled(" model ", label_style),
            Span::styled(" C ", key_style),
            Span::styled(" page ctx ", label_style),
            Span::styled(" K ", key_style),
            Span::styled(" persona ", label_style),
            Span::styled(" D ", key_style),
            Span::styled(" clear ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}

fn render_model_picker<C: GenerationClient>(app: &mut App<C>, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(44, 7, area);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = AiModel::all()
        .iter()
        .map(|model| {
            let (backend_id, config) = model.resolve();
            let note = if config.thinking_budget.is_some() {
                format!("{backend_id} +thinking")
            } else {
                backend_id.to_string()
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{:<22}", model.display_name())),
                Span::styled(note, Style::default().fg(Color::Gray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Model Intelligence "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup, &mut app.model_picker_state);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
