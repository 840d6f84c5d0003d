use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use ragchat_core::ChatRole;

use crate::app::{App, FocusPane};

const TITLE: &str = "AI Chatbot with Ollama and RAG";

/// Colors for the light and dark themes
struct Palette {
    bg: Color,
    fg: Color,
    panel: Color,
    user: Color,
    assistant: Color,
    muted: Color,
    focus: Color,
}

impl Palette {
    fn for_app(app: &App) -> Self {
        if app.dark_mode {
            Self {
                bg: Color::Rgb(17, 24, 39),
                fg: Color::White,
                panel: Color::Rgb(31, 41, 55),
                user: Color::Rgb(96, 165, 250),
                assistant: Color::Rgb(209, 213, 219),
                muted: Color::Gray,
                focus: Color::Cyan,
            }
        } else {
            Self {
                bg: Color::Rgb(243, 244, 246),
                fg: Color::Black,
                panel: Color::White,
                user: Color::Blue,
                assistant: Color::Rgb(55, 65, 81),
                muted: Color::DarkGray,
                focus: Color::Blue,
            }
        }
    }
}

/// Render `**bold**` segments of a reply line; everything else is plain.
fn parse_markdown_line(text: &str) -> Line<'static> {
    if !text.contains("**") {
        return Line::from(text.to_string());
    }

    let parts: Vec<&str> = text.split("**").collect();
    // An odd number of markers leaves the last one unmatched; keep it literal.
    let balanced = parts.len() % 2 == 1;
    let mut spans = Vec::with_capacity(parts.len());
    for (i, part) in parts.iter().enumerate() {
        let is_bold = i % 2 == 1;
        if is_bold && (balanced || i + 1 < parts.len()) {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else if is_bold {
            spans.push(Span::raw(format!("**{}", part)));
        } else if !part.is_empty() {
            spans.push(Span::raw(part.to_string()));
        }
    }
    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let palette = Palette::for_app(app);
    let area = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)),
        area,
    );

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", TITLE), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!(" via {}", app.gateway_url), Style::default().fg(palette.muted)),
    ]));
    frame.render_widget(header, header_area);

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(26),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_sidebar(app, frame, sidebar_area, &palette);
    render_chat(app, frame, main_area, &palette);

    let footer = Paragraph::new(
        " Enter send | Tab focus | ^N new chat | ^L clear | ^T theme | ^G language | Esc quit",
    )
    .style(Style::default().fg(palette.muted));
    frame.render_widget(footer, footer_area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [list_area, settings_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(5),
    ])
    .areas(area);

    let focused = app.focus == FocusPane::Sidebar;
    let border_color = if focused { palette.focus } else { palette.muted };
    let current = app.current_session_id();

    let items: Vec<ListItem> = app
        .sessions()
        .iter()
        .map(|s| {
            let style = if Some(s.id()) == current {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(s.title().to_string(), style),
                Span::styled(
                    format!("  {}", s.created_at().format("%H:%M")),
                    Style::default().fg(palette.muted),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .style(Style::default().bg(palette.panel))
                .title(" Chats (^N new) "),
        )
        .highlight_style(Style::default().fg(palette.focus).add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, list_area, &mut app.sidebar_state);

    let theme = if app.dark_mode { "Dark" } else { "Light" };
    let settings = Paragraph::new(vec![
        Line::from(format!("Theme: {}", theme)),
        Line::from(format!("Language: {}", app.language.display_name())),
        Line::from(format!("Models: {}", app.models_label())),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.muted))
            .style(Style::default().bg(palette.panel))
            .title(" Settings "),
    );
    frame.render_widget(settings, settings_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let title = app
        .controller
        .store()
        .current()
        .map(|s| format!(" {} ", s.title()))
        .unwrap_or_else(|| " New conversation ".to_string());
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(title);

    let transcript = app.controller.store().transcript();
    let loading = app.is_loading();

    let chat_text = if transcript.is_empty() && !loading {
        Text::from(Span::styled(
            "Start a conversation below.",
            Style::default().fg(palette.muted),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in transcript {
            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(palette.user).add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(msg.content.lines().map(|l| Line::from(l.to_string())));
                }
                ChatRole::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "AI:",
                        Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(msg.content.lines().map(parse_markdown_line));
                }
            }
            lines.push(Line::default());
        }

        if loading {
            lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(palette.assistant).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area, palette);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, palette: &Palette) {
    let focused = app.focus == FocusPane::Input;
    let loading = app.is_loading();
    let border_color = if loading {
        palette.muted
    } else if focused {
        palette.focus
    } else {
        palette.muted
    };
    let title = if loading { " Waiting for reply... " } else { " Send (Enter) " };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width > 0 && cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() {
        Paragraph::new(app.placeholder()).style(Style::default().fg(palette.muted))
    } else {
        let visible: String = app.input.chars().skip(scroll_offset).take(inner_width).collect();
        Paragraph::new(visible).style(Style::default().fg(palette.user))
    };
    frame.render_widget(input.block(block), area);

    if focused {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_plain_line() {
        let line = parse_markdown_line("just text");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "just text");
    }

    #[test]
    fn test_markdown_bold_segment() {
        let line = parse_markdown_line("a **b** c");
        let contents: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(contents, vec!["a ", "b", " c"]);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_markdown_unclosed_marker_is_literal() {
        let line = parse_markdown_line("a **b");
        let contents: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(contents, vec!["a ", "**b"]);
    }
}
