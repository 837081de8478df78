use crate::artwork;
use crate::audio::MediaBackend;
use crate::core::PlaybackController;
use crate::model::{RepeatMode, Track};
use rand::Rng;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use std::time::Duration;

const APP_TITLE_WITH_VERSION: &str = "tunedeck v0.1.0  ";

#[derive(Debug, Default)]
pub struct ViewState {
    pub selected: usize,
    pub status: String,
    /// In-session only, never written to the playlist file.
    pub favorite: bool,
}

#[derive(Clone, Copy)]
struct ThemePalette {
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

// Gradient ends match the generated placeholder artwork.
const PALETTE: ThemePalette = ThemePalette {
    panel_bg: Color::Rgb(19, 29, 43),
    panel_alt_bg: Color::Rgb(24, 38, 58),
    border: Color::Rgb(108, 92, 231),
    text: Color::Rgb(214, 228, 248),
    muted: Color::Rgb(149, 173, 204),
    accent: Color::Rgb(0, 212, 255),
    alert: Color::Rgb(249, 174, 88),
    selected_bg: Color::Rgb(34, 55, 82),
};

pub fn draw<B: MediaBackend, R: Rng>(
    frame: &mut Frame,
    controller: &PlaybackController<B, R>,
    view: &ViewState,
) {
    let colors = PALETTE;
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} tracks", controller.playlist().len()),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            mode_label(controller.shuffle(), controller.repeat_mode()),
            Style::default().fg(colors.alert),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(controller.output_name(), Style::default().fg(colors.muted)),
    ]))
    .block(panel_block("Status", colors.panel_bg, colors.text, colors.border));
    frame.render_widget(header, vertical[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(vertical[1]);

    let items: Vec<ListItem> = controller
        .playlist()
        .tracks()
        .iter()
        .enumerate()
        .map(|(idx, track)| {
            let active = idx == controller.index();
            let marker = match (active, controller.is_playing()) {
                (true, true) => "  > ",
                (true, false) => "  = ",
                _ => "    ",
            };
            let title_style = if active {
                Style::default()
                    .fg(track_accent(track, colors.accent))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.text)
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.muted)),
                Span::styled(track.title.as_str(), title_style),
                Span::styled(format!("  {}", track.artist), Style::default().fg(colors.muted)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(view.selected.min(controller.playlist().len() - 1)));

    let list = List::new(items)
        .block(panel_block("Playlist", colors.panel_bg, colors.text, colors.border))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, body[0], &mut state);

    let track = controller.current_track();
    let accent = track_accent(track, colors.accent);
    let status_word = if controller.is_playing() {
        "Playing"
    } else {
        "Paused"
    };
    let info_text = vec![
        Line::from(Span::styled(
            format!("  [ {} ]", artwork::initials(&track.title)),
            Style::default()
                .fg(accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                status_word,
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", track.title), Style::default().fg(colors.text)),
            Span::styled(
                format!("  {}", favorite_glyph(view.favorite)),
                Style::default().fg(colors.alert),
            ),
        ]),
        Line::from(Span::styled(
            format!("Artist  {}", display_or_dash(&track.artist)),
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            format!("Art     {}", artwork_label(track)),
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            format!(
                "Track   {}/{}",
                controller.index() + 1,
                controller.playlist().len()
            ),
            Style::default().fg(colors.alert),
        )),
    ];
    let info_block = Paragraph::new(info_text)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(info_block, body[1]);

    let timeline = timeline_line(
        controller.position(),
        controller.duration(),
        controller.volume(),
        controller.is_muted(),
        30,
        12,
    );
    let timeline_block = Paragraph::new(Span::styled(timeline, Style::default().fg(colors.text)))
        .block(panel_block("Timeline", colors.panel_bg, colors.text, colors.border));
    frame.render_widget(timeline_block, vertical[2]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "Space play, <-/-> prev/next, s shuffle, r repeat, m mute, f favorite, +/- volume, 0-9 seek, q quit",
            Style::default().fg(colors.muted),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(view.status.as_str(), Style::default().fg(colors.text)),
    ]))
    .block(panel_block("Message", colors.panel_bg, colors.text, colors.border));
    frame.render_widget(footer, vertical[3]);
}

pub fn mode_label(shuffle: bool, repeat: RepeatMode) -> String {
    let shuffle = if shuffle { "on" } else { "off" };
    format!("Shuffle {shuffle}  Repeat {}", repeat.label())
}

fn favorite_glyph(favorite: bool) -> &'static str {
    if favorite { "\u{2665}" } else { "\u{2661}" }
}

/// The track's own color when it parses (`#rrggbb` or a named color).
fn track_accent(track: &Track, fallback: Color) -> Color {
    track
        .color
        .as_deref()
        .and_then(|value| value.trim().parse::<Color>().ok())
        .unwrap_or(fallback)
}

/// Artwork locator, with data URLs collapsed to their media type.
fn artwork_label(track: &Track) -> String {
    let art = track.artwork();
    match art.strip_prefix("data:") {
        Some(rest) => {
            let media_type = rest.split(';').next().unwrap_or(rest);
            format!("{media_type} (embedded)")
        }
        None => art,
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
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

/// `m:ss`, with `0:00` standing in for an unknown time.
pub fn format_time(time: Option<Duration>) -> String {
    let total_seconds = time.map_or(0, |duration| duration.as_secs());
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes}:{seconds:02}")
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

fn timeline_line(
    position: Duration,
    duration: Option<Duration>,
    volume: f32,
    muted: bool,
    timeline_bar_width: usize,
    volume_bar_width: usize,
) -> String {
    let ratio = duration.and_then(|total| {
        let total_secs = total.as_secs_f64();
        (total_secs > 0.0).then_some((position.as_secs_f64() / total_secs).clamp(0.0, 1.0))
    });

    let volume_label = if muted {
        String::from("muted")
    } else {
        format!("{:>3}%", (volume * 100.0).round() as u16)
    };

    format!(
        "{} / {} {}  |  Vol {} {}",
        format_time(Some(position)),
        format_time(duration),
        progress_bar(ratio, timeline_bar_width),
        progress_bar(Some(f64::from(volume)), volume_bar_width),
        volume_label
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_pads_seconds() {
        assert_eq!(format_time(Some(Duration::from_secs(65))), "1:05");
        assert_eq!(format_time(Some(Duration::from_millis(59_900))), "0:59");
        assert_eq!(format_time(Some(Duration::from_secs(3_600))), "60:00");
    }

    #[test]
    fn unknown_time_renders_as_zero() {
        assert_eq!(format_time(None), "0:00");
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(Some(0.5), 4), "[##--]");
        assert_eq!(progress_bar(None, 3), "[---]");
        assert_eq!(progress_bar(Some(2.0), 2), "[##]");
    }

    #[test]
    fn timeline_shows_mute_state() {
        let line = timeline_line(Duration::from_secs(30), Some(Duration::from_secs(60)), 0.5, true, 4, 2);
        assert!(line.starts_with("0:30 / 1:00 [##--]"));
        assert!(line.ends_with("muted"));
    }

    #[test]
    fn track_color_overrides_accent_when_valid() {
        let mut track = Track::new("Kammani", "Artist B", "kammani.mp3");
        assert_eq!(track_accent(&track, Color::Cyan), Color::Cyan);

        track.color = Some(String::from("#ff8800"));
        assert_eq!(track_accent(&track, Color::Cyan), Color::Rgb(255, 136, 0));

        track.color = Some(String::from("not a color"));
        assert_eq!(track_accent(&track, Color::Cyan), Color::Cyan);
    }

    #[test]
    fn artwork_label_shows_locator_or_generated_type() {
        let mut track = Track::new("Kammani", "Artist B", "kammani.mp3");
        assert_eq!(artwork_label(&track), "image/svg+xml (embedded)");

        track.art = Some(String::from("covers/kammani.png"));
        assert_eq!(artwork_label(&track), "covers/kammani.png");
    }

    #[test]
    fn favorite_glyph_reflects_flag() {
        assert_eq!(favorite_glyph(true), "\u{2665}");
        assert_eq!(favorite_glyph(false), "\u{2661}");
    }

    #[test]
    fn mode_label_names_both_modes() {
        assert_eq!(mode_label(true, RepeatMode::One), "Shuffle on  Repeat one");
    }
}
