use crate::browse::{BrowseModal, PendingBrowse};
use crate::commands::COMMANDS;
use crate::core::RemoteCore;
use crate::markup;
use crate::model::{PlayState, PlaybackSnapshot, Theme};
use crate::state::Presentation;
use crate::trivia::{FETCHING_TEXT, TriviaDisplay, TriviaEntry, UNAVAILABLE_TEXT};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

const APP_TITLE_WITH_VERSION: &str = concat!("tune-remote v", env!("CARGO_PKG_VERSION"), "  ");

#[derive(Clone, Copy)]
struct ThemePalette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    playing: Color,
    selected_bg: Color,
    popup_bg: Color,
    popup_selected_bg: Color,
}

fn palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Dark => ThemePalette {
            bg: Color::Rgb(10, 15, 24),
            panel_bg: Color::Rgb(19, 29, 43),
            panel_alt_bg: Color::Rgb(24, 38, 58),
            border: Color::Rgb(69, 121, 176),
            text: Color::Rgb(214, 228, 248),
            muted: Color::Rgb(149, 173, 204),
            accent: Color::Rgb(100, 203, 184),
            alert: Color::Rgb(249, 174, 88),
            playing: Color::Rgb(156, 186, 255),
            selected_bg: Color::Rgb(34, 55, 82),
            popup_bg: Color::Rgb(22, 33, 51),
            popup_selected_bg: Color::Rgb(45, 70, 99),
        },
        Theme::PitchBlack => ThemePalette {
            bg: Color::Rgb(0, 0, 0),
            panel_bg: Color::Rgb(8, 8, 8),
            panel_alt_bg: Color::Rgb(15, 15, 15),
            border: Color::Rgb(74, 74, 74),
            text: Color::Rgb(242, 242, 242),
            muted: Color::Rgb(150, 150, 150),
            accent: Color::Rgb(212, 212, 212),
            alert: Color::Rgb(235, 176, 97),
            playing: Color::Rgb(178, 195, 220),
            selected_bg: Color::Rgb(26, 26, 26),
            popup_bg: Color::Rgb(10, 10, 10),
            popup_selected_bg: Color::Rgb(34, 34, 34),
        },
        Theme::Ocean => ThemePalette {
            bg: Color::Rgb(4, 18, 28),
            panel_bg: Color::Rgb(8, 32, 48),
            panel_alt_bg: Color::Rgb(12, 42, 62),
            border: Color::Rgb(42, 140, 180),
            text: Color::Rgb(210, 240, 250),
            muted: Color::Rgb(128, 178, 198),
            accent: Color::Rgb(96, 226, 230),
            alert: Color::Rgb(255, 190, 110),
            playing: Color::Rgb(130, 200, 255),
            selected_bg: Color::Rgb(20, 64, 90),
            popup_bg: Color::Rgb(10, 38, 56),
            popup_selected_bg: Color::Rgb(28, 84, 112),
        },
    }
}

fn main_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(area)
}

fn body_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(area)
}

/// Area of the command menu, for mouse hit testing.
pub fn menu_rect(area: Rect) -> Rect {
    body_layout(main_layout(area)[2])[0]
}

pub fn draw(frame: &mut Frame, core: &RemoteCore, app_name: &str, theme: Theme) {
    let colors = palette(theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = main_layout(frame.area());
    draw_header(frame, core, app_name, &colors, vertical[0]);
    draw_now_playing(frame, core.presentation(), app_name, &colors, vertical[1]);

    let body = body_layout(vertical[2]);
    draw_menu(frame, core, &colors, body[0]);
    draw_trivia(frame, core, &colors, body[1]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "Keys: arrows select, Enter run, Left/Right seek, l browse, q quit",
            Style::default().fg(colors.muted),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
    ]))
    .block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, vertical[3]);

    if core.browse.is_open() {
        draw_browse(frame, core, &colors);
    }
}

fn draw_header(
    frame: &mut Frame,
    core: &RemoteCore,
    app_name: &str,
    colors: &ThemePalette,
    area: Rect,
) {
    let (state_label, state_color) = match core.presentation() {
        Presentation::Connecting => (String::from("Connecting"), colors.muted),
        Presentation::Live(snapshot) => (
            snapshot.play_state.label().to_string(),
            match snapshot.play_state {
                PlayState::Playing => colors.accent,
                PlayState::Paused => colors.alert,
                PlayState::Stopped => colors.muted,
            },
        ),
        Presentation::Error(_) => (String::from("Unavailable"), colors.alert),
    };

    let mut spans = vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("Player {app_name}"), Style::default().fg(colors.text)),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(state_label, Style::default().fg(state_color)),
    ];
    if core.poll_in_flight() {
        spans.push(Span::styled("  *", Style::default().fg(colors.muted)));
    }

    let header = Paragraph::new(Line::from(spans)).block(panel_block(
        "Status",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(header, area);
}

fn draw_now_playing(
    frame: &mut Frame,
    presentation: &Presentation,
    app_name: &str,
    colors: &ThemePalette,
    area: Rect,
) {
    let lines = match presentation {
        Presentation::Connecting => vec![Line::from(Span::styled(
            format!("Connecting to {app_name}..."),
            Style::default().fg(colors.muted),
        ))],
        Presentation::Error(message) => vec![
            Line::from(Span::styled(
                "Player unavailable",
                Style::default()
                    .fg(colors.alert)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(colors.muted),
            )),
        ],
        Presentation::Live(snapshot) => now_playing_lines(snapshot, colors),
    };

    let block = Paragraph::new(lines)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(block, area);
}

fn now_playing_lines(snapshot: &PlaybackSnapshot, colors: &ThemePalette) -> Vec<Line<'static>> {
    let title = or_dash(&snapshot.track_name);
    let up_next = if snapshot.next_track_name.is_empty() {
        String::from("-")
    } else if snapshot.next_artist.is_empty() {
        snapshot.next_track_name.clone()
    } else {
        format!("{} - {}", snapshot.next_track_name, snapshot.next_artist)
    };

    vec![
        Line::from(vec![
            Span::styled(
                "Now",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {title}"), Style::default().fg(colors.playing)),
        ]),
        Line::from(Span::styled(
            format!(
                "Artist  {}   Album  {}",
                or_dash(&snapshot.artist),
                or_dash(&snapshot.album)
            ),
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            timeline_line(snapshot, 26),
            Style::default().fg(colors.text),
        )),
        Line::from(Span::styled(
            format!(
                "Shuffle {}  |  Repeat {}  |  Vol {} {:>3}%",
                if snapshot.shuffle_enabled { "On" } else { "Off" },
                snapshot.repeat_mode.label(),
                progress_bar(Some(f64::from(snapshot.volume_percent) / 100.0), 14),
                snapshot.volume_percent
            ),
            Style::default().fg(colors.alert),
        )),
        Line::from(Span::styled(
            format!("Up next  {up_next}"),
            Style::default().fg(colors.muted),
        )),
    ]
}

fn draw_menu(frame: &mut Frame, core: &RemoteCore, colors: &ThemePalette, area: Rect) {
    let items: Vec<ListItem> = COMMANDS
        .iter()
        .map(|command| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<7}", command.key_hint),
                    Style::default().fg(colors.muted),
                ),
                Span::styled(command.label, Style::default().fg(colors.text)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(core.menu_selected.min(COMMANDS.len() - 1)));

    let list = List::new(items)
        .block(panel_block(
            "Commands",
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_trivia(frame: &mut Frame, core: &RemoteCore, colors: &ThemePalette, area: Rect) {
    let title = match core.trivia_panel.identity() {
        Some(identity) => format!("Trivia: {}", identity.title),
        None => String::from("Trivia"),
    };

    let muted = |text: String| vec![Line::from(Span::styled(text, Style::default().fg(colors.muted)))];
    let lines = match core.trivia_panel.display() {
        TriviaDisplay::Empty => muted(String::from("Nothing playing.")),
        TriviaDisplay::Fetching => muted(String::from(FETCHING_TEXT)),
        TriviaDisplay::Ready(TriviaEntry::Text(raw)) => {
            markup::to_lines(&markup::render(raw), colors.accent, colors.text)
        }
        TriviaDisplay::Ready(TriviaEntry::Unavailable) => muted(String::from(UNAVAILABLE_TEXT)),
        TriviaDisplay::Ready(TriviaEntry::FetchError(err)) => vec![Line::from(Span::styled(
            format!("Trivia fetch failed: {err}"),
            Style::default().fg(colors.alert),
        ))],
    };

    let block = Paragraph::new(lines)
        .block(panel_block(
            &title,
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: false });
    frame.render_widget(block, area);
}

fn draw_browse(frame: &mut Frame, core: &RemoteCore, colors: &ThemePalette) {
    let (title, labels, selected): (String, Vec<String>, usize) = match core.browse.modal() {
        BrowseModal::Closed => return,
        BrowseModal::PlaylistList {
            playlists,
            selected,
        } => (String::from("Playlists"), playlists.clone(), *selected),
        BrowseModal::TrackList {
            playlist,
            tracks,
            selected,
        } => (
            format!("Playlists / {playlist}"),
            tracks
                .iter()
                .map(|track| {
                    if track.artist.is_empty() {
                        format!("{:>3}. {}", track.index, track.name)
                    } else {
                        format!("{:>3}. {} - {}", track.index, track.name, track.artist)
                    }
                })
                .collect(),
            *selected,
        ),
    };

    let popup = centered_rect(frame.area(), 62, 58);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = if labels.is_empty() {
        vec![ListItem::new(Span::styled(
            "(empty)",
            Style::default().fg(colors.muted),
        ))]
    } else {
        labels
            .into_iter()
            .map(|label| ListItem::new(Span::styled(label, Style::default().fg(colors.text))))
            .collect()
    };

    let mut state = ListState::default();
    state.select(Some(selected.min(items.len() - 1)));

    let list = List::new(items)
        .block(panel_block(
            &title,
            colors.popup_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.popup_selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, popup, &mut state);

    let hint = match core.browse.pending() {
        Some(PendingBrowse::Tracks(playlist)) => format!("Loading {playlist}..."),
        Some(PendingBrowse::Play { index, .. }) => format!("Starting track {index}..."),
        Some(PendingBrowse::Playlists) => String::from("Loading playlists..."),
        None => String::from("Enter select  Esc close"),
    };
    let hint_area = Rect {
        x: popup.x.saturating_add(2),
        y: popup.y.saturating_add(popup.height.saturating_sub(2)),
        width: popup.width.saturating_sub(4),
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Style::default().fg(colors.muted))),
        hint_area,
    );
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn format_seconds(seconds: f64) -> String {
    let total_seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar.push(']');
    bar
}

fn timeline_line(snapshot: &PlaybackSnapshot, bar_width: usize) -> String {
    let total = if snapshot.duration_seconds > 0.0 {
        format_seconds(snapshot.duration_seconds)
    } else {
        String::from("--:--")
    };
    format!(
        "{} / {} {}",
        format_seconds(snapshot.position_seconds),
        total,
        progress_bar(snapshot.progress_ratio(), bar_width)
    )
}
