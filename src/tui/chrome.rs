// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Title, footer and line styling helpers used by TUI rendering.
const PROMPT_PREFIX: &str = "seek> ";
const COMMENT_SEPARATOR: &str = "  ; ";

fn view_title(label: &str, key: char, tail: Option<&str>) -> String {
    let mut title = format!("─[{key}]─ {label}");
    if let Some(tail) = tail {
        let tail = tail.trim();
        if !tail.is_empty() {
            title.push(' ');
            title.push_str(tail);
        }
    }
    title.push(' ');
    title
}

fn footer_help_line(app: &App, toast_suffix: &str) -> Line<'static> {
    let theme = &app.theme;
    let mut spans = Vec::<Span<'static>>::new();
    let no_side = !app.side_visible;

    match app.pane {
        Pane::Disassembly => {
            push_footer_entry(&mut spans, theme, "MOVE", "jk");
            push_footer_entry(&mut spans, theme, "PAGE", "PgUp/PgDn");
            push_footer_entry(&mut spans, theme, "JUMP", "Enter");
        }
        Pane::Outgoing | Pane::Incoming => {
            push_footer_entry(&mut spans, theme, "SELECT", "jk");
            push_footer_entry(&mut spans, theme, "FOLLOW", "Enter");
        }
    }
    push_footer_entry(&mut spans, theme, "BACK", "Esc");
    push_footer_entry(&mut spans, theme, "SEEK", "g");
    push_footer_entry_maybe_disabled(&mut spans, theme, "PANE", "Tab", no_side);
    push_footer_entry_maybe_disabled(&mut spans, theme, "TAB", "pdv", no_side);
    push_footer_entry_maybe_disabled(&mut spans, theme, "CHART", "c", no_side);
    push_footer_entry(&mut spans, theme, "SIDE", "s");
    push_footer_entry(&mut spans, theme, "QUIT", "q");

    if !toast_suffix.is_empty() {
        spans.push(Span::raw(toast_suffix.to_owned()));
    }
    Line::from(spans)
}

fn prompt_footer_line(theme: &TuiTheme, query: &str, toast_suffix: &str) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            PROMPT_PREFIX.to_owned(),
            theme.footer_key_style().add_modifier(Modifier::BOLD),
        ),
        Span::raw(query.to_owned()),
        Span::raw("   "),
    ];
    push_footer_entry_with_separator(&mut spans, theme, "GO", "Enter", " ");
    push_footer_entry(&mut spans, theme, "CANCEL", "Esc");
    if !toast_suffix.is_empty() {
        spans.push(Span::raw(toast_suffix.to_owned()));
    }
    Line::from(spans)
}

fn footer_brand_line(theme: &TuiTheme) -> Line<'static> {
    Line::from(vec![Span::styled(
        FOOTER_BRAND.to_owned(),
        theme.header_style(),
    )])
}

fn push_footer_entry(spans: &mut Vec<Span<'static>>, theme: &TuiTheme, label: &str, value: &str) {
    push_footer_entry_maybe_disabled(spans, theme, label, value, false);
}

fn push_footer_entry_maybe_disabled(
    spans: &mut Vec<Span<'static>>,
    theme: &TuiTheme,
    label: &str,
    value: &str,
    disabled: bool,
) {
    push_footer_entry_with_separator_maybe_disabled(spans, theme, label, value, " | ", disabled);
}

fn push_footer_entry_with_separator(
    spans: &mut Vec<Span<'static>>,
    theme: &TuiTheme,
    label: &str,
    value: &str,
    separator: &'static str,
) {
    push_footer_entry_with_separator_maybe_disabled(spans, theme, label, value, separator, false);
}

fn push_footer_entry_with_separator_maybe_disabled(
    spans: &mut Vec<Span<'static>>,
    theme: &TuiTheme,
    label: &str,
    value: &str,
    separator: &'static str,
    disabled: bool,
) {
    if !spans.is_empty() {
        spans.push(Span::styled(separator.to_owned(), theme.footer_label_style()));
    }
    spans.push(Span::styled(
        format!("{}:", footer_label_ucfirst(label)),
        theme.footer_label_style(),
    ));
    spans.extend(footer_value_spans(theme, value, disabled));
}

fn footer_label_ucfirst(label: &str) -> String {
    let lower = label.to_lowercase();
    let mut chars = lower.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out = first.to_uppercase().collect::<String>();
    out.push_str(chars.as_str());
    out
}

fn footer_value_spans(theme: &TuiTheme, value: &str, disabled: bool) -> Vec<Span<'static>> {
    let style = if disabled {
        theme.footer_label_style()
    } else {
        theme.footer_key_style()
    };
    vec![Span::styled(
        value.to_owned(),
        style.add_modifier(Modifier::BOLD),
    )]
}

/// Splits an instruction line into address, bytes, text and comment spans.
///
/// Lines without a leading address are painted whole: `;` lines as headers, others plain.
fn disasm_line(line: &str, theme: &TuiTheme, is_cursor: bool) -> Line<'static> {
    let mut spans = Vec::<Span<'static>>::new();

    if crate::viewport::parse_line_address(line).is_none() {
        let style = if line.trim_start().starts_with(';') {
            theme.header_style()
        } else {
            theme.base_style()
        };
        spans.push(Span::styled(line.to_owned(), style));
    } else {
        let (body, comment) = match line.find(COMMENT_SEPARATOR) {
            Some(idx) => (&line[..idx], Some(&line[idx..])),
            None => (line, None),
        };
        let (address, rest) = split_leading_token(body);
        let (bytes, text) = split_leading_token(rest);
        spans.push(Span::styled(address.to_owned(), theme.address_style()));
        spans.push(Span::styled(bytes.to_owned(), theme.bytes_style()));
        spans.push(Span::styled(text.to_owned(), theme.base_style()));
        if let Some(comment) = comment {
            spans.push(Span::styled(comment.to_owned(), theme.comment_style()));
        }
    }

    if is_cursor {
        for span in &mut spans {
            span.style = span.style.patch(theme.selection_style());
        }
    }
    Line::from(spans)
}

/// Returns the first whitespace-delimited token with its trailing whitespace, then the rest.
fn split_leading_token(text: &str) -> (&str, &str) {
    let start = text.len() - text.trim_start().len();
    let token_end = text[start..]
        .find(char::is_whitespace)
        .map_or(text.len(), |idx| start + idx);
    let rest_start = text[token_end..]
        .find(|ch: char| !ch.is_whitespace())
        .map_or(text.len(), |idx| token_end + idx);
    (&text[..rest_start], &text[rest_start..])
}

fn info_text(panels: &Panels, theme: &TuiTheme) -> Text<'static> {
    let mut lines = Vec::<Line<'static>>::new();
    if let Some(label) = panels.function_label() {
        lines.push(Line::styled(label.to_owned(), theme.label_style()));
    }

    let Some(offset) = panels.offset() else {
        if lines.is_empty() {
            return placeholder("No instruction under cursor", theme);
        }
        return Text::from(lines);
    };

    let label_width = offset
        .rows
        .iter()
        .map(|row| row.label.chars().count())
        .max()
        .unwrap_or(0);
    for row in &offset.rows {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<label_width$} ", row.label),
                theme.footer_label_style(),
            ),
            Span::styled(row.value.clone(), theme.base_style()),
        ]));
    }
    if let Some(description) = offset.description.as_ref() {
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", description.mnemonic), theme.label_style()),
            Span::styled(description.text.clone(), theme.comment_style()),
        ]));
    }
    Text::from(lines)
}

fn reference_line(entry: &RefEntry, theme: &TuiTheme) -> Line<'static> {
    Line::from(vec![
        Span::styled(entry.address.to_string(), theme.address_style()),
        Span::styled(
            format!(" {} ", entry.edge.kind().as_str()),
            theme.footer_label_style(),
        ),
        Span::styled(entry.preview.trim().to_owned(), theme.base_style()),
    ])
}

/// Preview text plus the scroll offset that puts the target line at the top.
fn preview_text(preview: &JumpPreview, theme: &TuiTheme) -> (Text<'static>, u16) {
    let lines: Vec<Line<'static>> = preview
        .lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            if preview.highlight == Some(idx) {
                Line::styled(line.clone(), theme.target_style())
            } else {
                disasm_line(line, theme, false)
            }
        })
        .collect();
    let scroll = preview
        .highlight
        .map_or(0, |idx| idx.min(u16::MAX as usize) as u16);
    (Text::from(lines), scroll)
}

fn placeholder(message: &str, theme: &TuiTheme) -> Text<'static> {
    Text::from(Line::styled(message.to_owned(), theme.comment_style()))
}

/// Text rendition of the radial chart: one proportional arc of dots per metric.
fn radial_text(metrics: &GraphMetrics, theme: &TuiTheme) -> Text<'static> {
    const ARC_WIDTH: u64 = 24;
    let labeled = metrics.labeled();
    let max = labeled.iter().map(|(_, value)| *value).max().unwrap_or(0).max(1);

    let lines: Vec<Line<'static>> = labeled
        .iter()
        .map(|(label, value)| {
            let filled = ((value * ARC_WIDTH + max - 1) / max) as usize;
            let filled = if *value == 0 { 0 } else { filled.max(1) };
            Line::from(vec![
                Span::styled(format!("{label:>6} "), theme.footer_label_style()),
                Span::styled("◉".repeat(filled), theme.bar_style()),
                Span::styled(
                    "·".repeat(ARC_WIDTH as usize - filled),
                    theme.bytes_style(),
                ),
                Span::styled(format!(" {value}"), theme.base_style()),
            ])
        })
        .collect();
    Text::from(lines)
}
