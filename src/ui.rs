use crate::app::{App, ViewMode};
use crate::braille::PixelCanvas;
use crate::interaction::Label;
use crate::style::Rgb;
use crate::visit::Party;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App, canvas: &PixelCanvas) {
    let area = frame.area();

    // Split into map area, status bar and legend
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Legend
        ])
        .split(area);

    render_map(frame, app, canvas, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
    render_legend(frame, app, chunks[2]);
}

fn render_map(frame: &mut Frame, app: &App, canvas: &PixelCanvas, area: Rect) {
    let title = match app.mode {
        ViewMode::Flat => " Visited Map ",
        ViewMode::Globe => " Visited Globe ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Cursor in map cells (border is 1 cell)
    let cursor_pos = app.mouse_pos.and_then(|(col, row)| {
        let cx = col.checked_sub(inner.x)?;
        let cy = row.checked_sub(inner.y)?;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    let map_widget = MapWidget {
        canvas,
        label: app.label(),
        cursor_pos,
    };
    frame.render_widget(map_widget, inner);
}

/// Braille map with the selection label overlaid
struct MapWidget<'a> {
    canvas: &'a PixelCanvas,
    label: Option<&'a Label>,
    cursor_pos: Option<(u16, u16)>,
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (col, row, cell) in self.canvas.cells() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            let x = area.x + col as u16;
            let y = area.y + row as u16;
            buf[(x, y)].set_char(cell.ch).set_fg(cell.color.into());
        }

        if let Some(label) = self.label {
            render_label(label, area, buf);
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
        }
    }
}

/// Tooltip one cell right of the click, kept inside the map area
fn render_label(label: &Label, area: Rect, buf: &mut Buffer) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let text = format!(" {} ", label.text);
    let len = text.chars().count().min(area.width as usize) as u16;
    let col = ((label.anchor.0 / 2.0) as u16).saturating_add(1);
    let row = (label.anchor.1 / 4.0) as u16;
    let x = area.x + col.min(area.width - len);
    let y = area.y + row.min(area.height - 1);
    let style = Style::default()
        .fg(Color::White)
        .bg(Color::Black)
        .add_modifier(Modifier::BOLD);
    for (i, ch) in text.chars().take(len as usize).enumerate() {
        buf[(x + i as u16, y)].set_char(ch).set_style(style);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let selected = app
        .label()
        .map(|l| l.text.clone())
        .unwrap_or_else(|| "none".to_string());

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | Selected: ", Style::default().fg(Color::DarkGray)),
        Span::styled(selected, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
    ];
    if app.mode == ViewMode::Globe {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)));
    }
    spans.push(Span::styled(
        " | drag:pan/zoom click:select hjkl:pan +/-:zoom g:globe c:clear r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn swatch(color: Rgb, text: String) -> [Span<'static>; 2] {
    [
        Span::styled(" ■ ", Style::default().fg(color.into())),
        Span::styled(text, Style::default().fg(Color::Gray)),
    ]
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let palette = app.palette();
    let membership = app.membership();
    let count = |party| membership.visited_count(party);

    let mut spans = Vec::new();
    spans.extend(swatch(palette.me, format!("You ({})", count(Party::Me))));
    spans.extend(swatch(palette.friend_one, format!("Friend ({})", count(Party::FriendOne))));
    if app.visited().has_friend_two() {
        spans.extend(swatch(palette.friend_two, format!("Friend 2 ({})", count(Party::FriendTwo))));
        spans.extend(swatch(palette.everyone, "All".to_string()));
    }
    spans.push(Span::styled(" ▨ ", Style::default().fg(palette.me.into())));
    spans.push(Span::styled("Shared", Style::default().fg(Color::Gray)));
    spans.extend(swatch(palette.unvisited, "Not visited".to_string()));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
