use std::iter;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Gauge, Paragraph, Wrap};

use crate::hooks::ProcessRunner;
use crate::parser::{Block as ContentBlock, InlineElement, Page};
use crate::sync::PageSync;
use crate::tui::app::App;
use crate::tui::syntax::SyntaxHighlighter;
use crate::tui::theme::Theme;

const RULE_WIDTH: usize = 40;

pub fn render<R: ProcessRunner, S: PageSync>(frame: &mut Frame, app: &App<R, S>) {
    let area = frame.area();

    // The progress gauge is pointless for a single page
    let progress_height = if app.controller.page_count() > 1 { 1 } else { 0 };
    let [page_area, progress_area, status_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(progress_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_page_window(frame, app, page_area);
    if progress_height > 0 {
        render_progress(frame, app, progress_area);
    }
    render_status_bar(frame, app, status_area);
}

fn render_page_window<R: ProcessRunner, S: PageSync>(frame: &mut Frame, app: &App<R, S>, area: Rect) {
    let theme = &app.theme;
    let title = Line::from(Span::styled(
        format!(" {} ", app.controller.title()),
        theme.title_style(),
    ))
    .centered();

    let window = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(theme.border_style())
        .title(title);

    let text = render_page(app.controller.page(), &app.highlighter, theme);
    let max_scroll = u16::try_from(text.lines.len().saturating_sub(1)).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(text)
        .block(window)
        .style(theme.content_style())
        .wrap(Wrap { trim: false })
        .scroll((app.content_scroll.min(max_scroll), 0));

    frame.render_widget(paragraph, area);
}

fn render_progress<R: ProcessRunner, S: PageSync>(frame: &mut Frame, app: &App<R, S>, area: Rect) {
    let current = app.controller.current();
    let count = app.controller.page_count();
    let ratio = (current - 1) as f64 / (count - 1) as f64;

    let gauge = Gauge::default()
        .ratio(ratio.clamp(0.0, 1.0))
        .label("")
        .use_unicode(true)
        .gauge_style(
            Style::default()
                .fg(app.theme.gauge_fg)
                .bg(app.theme.gauge_bg),
        );
    frame.render_widget(gauge, area);
}

fn render_status_bar<R: ProcessRunner, S: PageSync>(frame: &mut Frame, app: &App<R, S>, area: Rect) {
    let theme = &app.theme;

    if let Some(ref msg) = app.status_message {
        let bg = if msg.starts_with('✗') {
            theme.error_bg
        } else if msg.starts_with('⚠') {
            theme.warning_bg
        } else {
            theme.status_bg
        };
        let status = Paragraph::new(msg.clone()).style(
            Style::default()
                .bg(bg)
                .fg(theme.status_fg)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status, area);
        return;
    }

    let position = format!(
        " {}/{} ",
        app.controller.current(),
        app.controller.page_count()
    );
    let hint = if app.pending_page.is_empty() {
        " ←/→ page · g/G first/last · 12⏎ go to page · j/k scroll · q quit".to_string()
    } else {
        format!(" Go to page: {}▏", app.pending_page)
    };

    let width = u16::try_from(position.chars().count()).unwrap_or(u16::MAX);
    let [hint_area, position_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(width)]).areas(area);

    let style = Style::default().bg(theme.status_bg).fg(theme.status_fg);
    frame.render_widget(Paragraph::new(hint).style(style), hint_area);
    frame.render_widget(
        Paragraph::new(position).style(style.add_modifier(Modifier::BOLD)),
        position_area,
    );
}

/// Renders the blocks of a page as styled text.
pub fn render_page(page: &Page, highlighter: &SyntaxHighlighter, theme: &Theme) -> Text<'static> {
    let mut lines = Vec::new();
    for (index, block) in page.blocks().iter().enumerate() {
        if index > 0 {
            lines.push(Line::from(""));
        }
        lines.extend(render_block(block, highlighter, theme));
    }
    Text::from(lines)
}

fn render_block(
    block: &ContentBlock,
    highlighter: &SyntaxHighlighter,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match block {
        ContentBlock::Heading {
            level,
            content,
            inline,
            ..
        } => {
            let mut modifier = Modifier::BOLD;
            if *level == 1 {
                modifier |= Modifier::UNDERLINED;
            }
            let heading_style = Style::default()
                .fg(theme.heading_color(*level))
                .add_modifier(modifier);

            let mut spans = inline_or_plain(inline, content, theme);
            for span in &mut spans {
                span.style = heading_style;
            }
            lines.push(Line::from(spans));
        }
        ContentBlock::Paragraph { content, inline } => {
            if inline.is_empty() {
                lines.extend(
                    content
                        .lines()
                        .map(|line| Line::from(Span::styled(line.to_string(), theme.text_style()))),
                );
            } else {
                lines.push(Line::from(render_inline_elements(inline, theme)));
            }
        }
        ContentBlock::Code {
            language, content, ..
        } => {
            let lang = language.as_deref().unwrap_or("");
            lines.push(Line::from(Span::styled(
                format!("```{}", lang),
                theme.code_fence_style(),
            )));
            lines.extend(highlighter.highlight_code(content, lang));
            lines.push(Line::from(Span::styled("```", theme.code_fence_style())));
        }
        ContentBlock::List { ordered, items } => {
            for (idx, item) in items.iter().enumerate() {
                let prefix = if let Some(checked) = item.checked {
                    if checked { "  ☑ ".to_string() } else { "  ☐ ".to_string() }
                } else if *ordered {
                    format!("  {}. ", idx + 1)
                } else {
                    "  • ".to_string()
                };

                let first_line = item.content.lines().next().unwrap_or("");
                let mut spans = vec![Span::styled(prefix, Style::default().fg(theme.list_bullet))];
                spans.extend(inline_or_plain(&item.inline, first_line, theme));
                lines.push(Line::from(spans));

                for nested in &item.blocks {
                    for line in render_block(nested, highlighter, theme) {
                        lines.push(indent(line, "    "));
                    }
                }
            }
        }
        ContentBlock::Blockquote {
            content,
            blocks: nested,
        } => {
            let quoted: Vec<Line<'static>> = if nested.is_empty() {
                content
                    .lines()
                    .map(|line| Line::from(Span::styled(line.to_string(), theme.text_style())))
                    .collect()
            } else {
                nested
                    .iter()
                    .flat_map(|block| render_block(block, highlighter, theme))
                    .collect()
            };
            for line in quoted {
                let mut spans = vec![Span::styled(
                    "│ ",
                    Style::default().fg(theme.blockquote_border),
                )];
                spans.extend(line.spans.into_iter().map(|span| {
                    Span::styled(
                        span.content,
                        span.style
                            .fg(theme.blockquote_fg)
                            .add_modifier(Modifier::ITALIC),
                    )
                }));
                lines.push(Line::from(spans));
            }
        }
        ContentBlock::Table { headers, rows, .. } => {
            lines.extend(render_table(headers, rows, theme));
        }
        ContentBlock::Image { alt, .. } => {
            lines.push(Line::from(vec![
                Span::styled("🖼 ", Style::default().fg(theme.rule)),
                Span::styled(alt.clone(), theme.italic_style().fg(theme.link_fg)),
            ]));
        }
        ContentBlock::Details {
            summary,
            blocks: nested,
            ..
        } => {
            // A presentation has no interaction, so details are always open
            lines.push(Line::from(vec![
                Span::styled("▼ ", Style::default().fg(theme.list_bullet)),
                Span::styled(
                    summary.clone(),
                    Style::default()
                        .fg(theme.heading_color(3))
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
            for nested_block in nested {
                for line in render_block(nested_block, highlighter, theme) {
                    lines.push(indent(line, "  "));
                }
            }
        }
        ContentBlock::HorizontalRule => {
            lines.push(Line::from(Span::styled(
                "─".repeat(RULE_WIDTH),
                Style::default().fg(theme.rule),
            )));
        }
    }

    lines
}

fn indent(line: Line<'static>, prefix: &'static str) -> Line<'static> {
    let mut spans = vec![Span::raw(prefix)];
    spans.extend(line.spans);
    Line::from(spans)
}

fn inline_or_plain(inline: &[InlineElement], plain: &str, theme: &Theme) -> Vec<Span<'static>> {
    if inline.is_empty() {
        vec![Span::styled(plain.to_string(), theme.text_style())]
    } else {
        render_inline_elements(inline, theme)
    }
}

fn render_inline_elements(elements: &[InlineElement], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for element in elements {
        match element {
            InlineElement::Text { value } => {
                spans.push(Span::styled(value.clone(), theme.text_style()));
            }
            InlineElement::Strong { value } => {
                spans.push(Span::styled(value.clone(), theme.bold_style()));
            }
            InlineElement::Emphasis { value } => {
                spans.push(Span::styled(value.clone(), theme.italic_style()));
            }
            InlineElement::Code { value } => {
                spans.push(Span::styled(value.clone(), theme.inline_code_style()));
            }
            InlineElement::Link { text, .. } => {
                spans.push(Span::styled(
                    text.clone(),
                    Style::default()
                        .fg(theme.link_fg)
                        .add_modifier(Modifier::UNDERLINED),
                ));
            }
            InlineElement::Strikethrough { value } => {
                spans.push(Span::styled(
                    value.clone(),
                    theme.text_style().add_modifier(Modifier::CROSSED_OUT),
                ));
            }
            InlineElement::Image { alt, .. } => {
                spans.push(Span::styled(
                    format!("🖼 {}", alt),
                    theme.italic_style().fg(theme.link_fg),
                ));
            }
        }
    }

    if spans.is_empty() {
        spans.push(Span::raw(""));
    }
    spans
}

/// Draws a table with box-drawing separators, columns padded to their widest cell.
fn render_table(headers: &[String], rows: &[Vec<String>], theme: &Theme) -> Vec<Line<'static>> {
    let columns = rows.iter().map(Vec::len).fold(headers.len(), usize::max);
    let mut widths = vec![0usize; columns];
    for row in iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let border = Style::default().fg(theme.border);
    let format_row = |cells: &[String], style: Style| -> Line<'static> {
        let mut spans = Vec::with_capacity(columns * 2);
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" │ ", border));
            }
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            spans.push(Span::styled(format!("{:<width$}", cell, width = width), style));
        }
        Line::from(spans)
    };

    let mut lines = vec![format_row(headers, theme.bold_style())];
    let separator = widths
        .iter()
        .map(|width| "─".repeat(*width))
        .collect::<Vec<_>>()
        .join("─┼─");
    lines.push(Line::from(Span::styled(separator, border)));
    lines.extend(rows.iter().map(|row| format_row(row, theme.text_style())));
    lines
}
