use crate::app::{App, Tooltip};
use crate::legend::{Legend, LEGEND_WIDTH};
use crate::scale::Rgb;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};
use std::time::Instant;

/// Country outline color
const STROKE: Rgb = Rgb::hex(0xaaaaaa);

/// Render the UI
pub fn render(frame: &mut Frame, app: &App, now: Instant) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0], now);
    render_status_bar(frame, app, chunks[1]);

    if let Some(tooltip) = &app.tooltip {
        render_tooltip(frame, tooltip, chunks[0]);
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect, now: Instant) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Aid Projects by Recipient Country ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(MapWidget { app, now }, inner);

    // Legend in the bottom-left corner of the map
    let legend_width = (LEGEND_WIDTH + 6) as u16;
    let legend_height = 5;
    if inner.width > legend_width && inner.height > legend_height + 2 {
        let legend_area = Rect {
            x: inner.x + 1,
            y: inner.y + inner.height - legend_height - 1,
            width: legend_width,
            height: legend_height,
        };
        frame.render_widget(LegendWidget { legend: &app.legend }, legend_area);
    }
}

/// Choropleth fills as cell backgrounds with Braille outlines on top
struct MapWidget<'a> {
    app: &'a App,
    now: Instant,
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let raster = &self.app.raster;
        let borders = raster.borders();
        let rows = raster.rows().min(area.height as usize);
        let cols = raster.cols().min(area.width as usize);
        let stroke: Color = STROKE.into();

        for row in 0..rows {
            let y = area.y + row as u16;
            for col in 0..cols {
                let x = area.x + col as u16;
                let cell = &mut buf[(x, y)];

                if let Some(shape) = raster.shape_at(col, row) {
                    cell.set_bg(self.app.map.fill_at(shape, self.now).into());
                }
                if let Some(ch) = borders.cell(col, row) {
                    cell.set_char(ch).set_fg(stroke);
                }
            }
        }
    }
}

/// Gradient bar, tick marks and tick labels; no axis line
struct LegendWidget<'a> {
    legend: &'a Legend,
}

impl Widget for LegendWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                format!(" {} ", self.legend.label),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 3 || (inner.width as usize) < LEGEND_WIDTH {
            return;
        }

        let last = (LEGEND_WIDTH - 1) as f64;
        for i in 0..LEGEND_WIDTH {
            let color = self.legend.color_at(i as f64 / last);
            buf[(inner.x + i as u16, inner.y)].set_char(' ').set_bg(color.into());
        }

        let tick_style = Style::default().fg(Color::Gray);
        let bar = LEGEND_WIDTH as u16;
        let mut next_free = 0u16;
        for tick in &self.legend.ticks {
            let x = tick.x as u16;
            buf[(inner.x + x, inner.y + 1)].set_char('╵').set_style(tick_style);

            // Center the label under its tick, kept inside the bar; drop any that would collide
            let len = tick.label.chars().count() as u16;
            let start = x.saturating_sub(len / 2).min(bar.saturating_sub(len));
            if start < next_free || start + len > bar {
                continue;
            }
            buf.set_string(inner.x + start, inner.y + 2, &tick.label, tick_style);
            next_free = start + len + 1;
        }
    }
}

fn render_tooltip(frame: &mut Frame, tooltip: &Tooltip, bounds: Rect) {
    let width = tooltip.title.chars().count().max(tooltip.body.chars().count()) as u16 + 4;
    let height = 4;
    if bounds.width < width || bounds.height < height {
        return;
    }

    // Offset from the pointer, flipped back inside the map when near an edge
    let mut x = tooltip.col + 2;
    let mut y = tooltip.row + 1;
    if x + width > bounds.x + bounds.width {
        x = tooltip.col.saturating_sub(width + 1).max(bounds.x);
    }
    if y + height > bounds.y + bounds.height {
        y = tooltip.row.saturating_sub(height).max(bounds.y);
    }
    let area = Rect { x, y, width, height };

    let text = vec![
        Line::from(Span::styled(
            tooltip.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(tooltip.body.clone()),
    ];
    let paragraph = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];

    for (idx, (category, active)) in app.controls().into_iter().enumerate() {
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" [{}] {} ", idx + 1, category.tag()), style));
        spans.push(Span::raw(" "));
    }

    spans.extend([
        Span::styled("| Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | 1/2:flow hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Shown instead of the map when either data source failed to load
pub fn render_load_error(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let width = area.width.saturating_sub(4).min(80);
    let height = area.height.min(9);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let text = vec![
        Line::from(Span::styled(
            "The map could not be drawn because a data source failed to load.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled("Press q to quit", Style::default().fg(Color::DarkGray))),
    ];

    let paragraph = Paragraph::new(text).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(Span::styled(
                " Load failed ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, popup);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::FlowCategory;
    use crate::data::{CountryFeature, ProjectRecord};
    use ratatui::{backend::TestBackend, Terminal};

    fn app(now: Instant) -> App {
        let features = vec![CountryFeature {
            name: "Kenya".to_string(),
            iso_key: Some("KEN".to_string()),
            polygons: vec![vec![vec![
                (-40.0, -30.0),
                (40.0, -30.0),
                (40.0, 30.0),
                (-40.0, 30.0),
                (-40.0, -30.0),
            ]]],
        }];
        let records = vec![ProjectRecord {
            flow_type: Some("ODA".to_string()),
            recipient_key: Some("ken".to_string()),
        }];
        App::new(features, records, 62, 23, now)
    }

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_renders_map_legend_and_controls() {
        let now = Instant::now();
        let app = app(now);
        let mut terminal = Terminal::new(TestBackend::new(62, 23)).unwrap();
        terminal.draw(|frame| render(frame, &app, now)).unwrap();

        let buf = terminal.backend().buffer();
        let text = buffer_text(buf);
        assert!(text.contains("ODA project count"));
        assert!(text.contains("[1] ODA"));
        assert!(text.contains("[2] OOF"));

        // Center of the map is Kenya, filled with the top of the scale
        let expected: Color = app.state.scale.color_for(1.0).into();
        assert_eq!(buf[(31, 11)].bg, expected);
    }

    #[test]
    fn test_renders_tooltip() {
        let now = Instant::now();
        let mut app = app(now);
        app.pointer_moved(31, 11, now);
        app.dispatch(crate::app::Command::SelectCategory(FlowCategory::Oof), now);

        let mut terminal = Terminal::new(TestBackend::new(62, 23)).unwrap();
        terminal.draw(|frame| render(frame, &app, now)).unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Kenya"));
        assert!(text.contains("OOF projects: 0"));
    }

    #[test]
    fn test_legend_ticks_without_baseline() {
        let scale = crate::scale::ColorScale::new(crate::scale::ColorDomain::new(500));
        let legend = Legend::build(&scale, FlowCategory::Oda);
        let mut buf = Buffer::empty(Rect::new(0, 0, LEGEND_WIDTH as u16 + 6, 5));
        LegendWidget { legend: &legend }.render(buf.area, &mut buf);

        let inner_x = 1..buf.area.width - 1;
        let row = |y: u16| inner_x.clone().map(|x| buf[(x, y)].symbol().to_string()).collect::<Vec<_>>();

        // Tick row holds only tick marks, no axis line
        let ticks = row(2);
        assert!(ticks.iter().all(|s| s == "╵" || s == " "));
        assert_eq!(ticks.iter().filter(|s| *s == "╵").count(), legend.ticks.len());
        assert!((1..4).all(|y| row(y).iter().all(|s| s != "─")));

        // Labels sit under the bar
        let labels = row(3);
        let text = labels.concat();
        assert!(text.contains("0") && text.contains("100") && text.contains("500"));
        assert!(labels
            .iter()
            .enumerate()
            .all(|(i, s)| s == " " || i < LEGEND_WIDTH));
    }

    #[test]
    fn test_renders_load_error() {
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        terminal
            .draw(|frame| render_load_error(frame, "failed to read data/world.geojson"))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Load failed"));
        assert!(text.contains("failed to read data/world.geojson"));
    }
}
