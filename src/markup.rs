use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Cleans raw trivia text for display: drops a fenced-code wrapper around
/// the whole payload (models like to answer inside ```markdown fences).
pub fn render(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // Opening fence may carry a language tag on the same line.
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open,
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim().to_string()
}

/// Styles rendered text line by line: `#` headings, `-`/`*` bullets and
/// `**bold**` runs.
pub fn to_lines(text: &str, accent: Color, body: Color) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if let Some(heading) = heading_text(trimmed) {
                return Line::from(Span::styled(
                    heading.to_string(),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                ));
            }

            let (prefix, rest) = match trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                Some(rest) => (Some(Span::styled("• ", Style::default().fg(accent))), rest),
                None => (None, line),
            };

            let mut spans: Vec<Span<'static>> = prefix.into_iter().collect();
            spans.extend(bold_runs(rest, body));
            Line::from(spans)
        })
        .collect()
}

fn heading_text(line: &str) -> Option<&str> {
    let stripped = line.trim_start_matches('#');
    (stripped.len() < line.len() && (stripped.is_empty() || stripped.starts_with(' ')))
        .then(|| stripped.trim())
}

fn bold_runs(text: &str, color: Color) -> Vec<Span<'static>> {
    let plain = Style::default().fg(color);
    let bold = plain.add_modifier(Modifier::BOLD);
    text.split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(idx, part)| {
            let style = if idx % 2 == 1 { bold } else { plain };
            Span::styled(part.to_string(), style)
        })
        .collect()
}
