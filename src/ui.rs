use ratatui::{
    Frame,
    layout::{Constraint, Direction, Flex, Layout, Position, Rect},
    style::{Modifier, Style, Stylize},
    symbols::border,
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Clear, Paragraph},
};

use crate::domain::CMDMode;
use crate::model::UIData;

const STATS_HEIGHT: u16 = 1;
const CONTROLS_HEIGHT: u16 = 1;
const CMDLINE_HEIGHT: u16 = 1;

/// Pure rendering of the model's UIData snapshot. All aggregation
/// happens before the data gets here.
pub struct DashboardUI;

impl DashboardUI {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&self, uidata: &UIData, frame: &mut Frame) {
        let [chart_area, stats_area, controls_area, cmdline_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(STATS_HEIGHT),
            Constraint::Length(CONTROLS_HEIGHT),
            Constraint::Length(CMDLINE_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_chart(uidata, frame, chart_area);
        frame.render_widget(Paragraph::new(uidata.stats.as_str().bold()), stats_area);
        frame.render_widget(Paragraph::new(uidata.controls.as_str()), controls_area);
        self.draw_cmdline(uidata, frame, cmdline_area);

        if uidata.show_popup {
            self.draw_popup(uidata, frame);
        }
    }

    fn draw_chart(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let title = Line::from(format!(" {} ", uidata.title).bold());
        let name = Line::from(format!(" {} ", uidata.name).yellow());
        let instructions = Line::from(vec![
            " Relate ".into(),
            "<R>".blue().bold(),
            " Filter ".into(),
            "</>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_top(name.right_aligned())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        if uidata.series.is_empty() {
            let placeholder = Paragraph::new(Line::from("No bars to display".dim()).centered())
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        // One anonymous group for the single column chart, one labeled
        // group per series in the relation chart.
        let grouped = uidata.series.len() > 1;
        let mut chart = BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_gap(0)
            .group_gap(1);
        for series in &uidata.series {
            let bars: Vec<Bar> = series
                .points
                .iter()
                .map(|point| {
                    Bar::default()
                        .value(point.value)
                        .label(Line::from(point.label.clone()))
                        .style(Style::new().fg(point.color))
                        .value_style(Style::new().fg(point.color).add_modifier(Modifier::REVERSED))
                })
                .collect();
            let mut group = BarGroup::default().bars(&bars);
            if grouped {
                group = group.label(
                    Line::from(series.name.clone())
                        .style(Style::new().fg(series.color).add_modifier(Modifier::BOLD)),
                );
            }
            chart = chart.data(group);
        }
        frame.render_widget(chart, area);
    }

    fn draw_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if uidata.active_cmdinput {
            let prompt = match uidata.cmd_mode {
                Some(CMDMode::Filter) => "Filter: ",
                Some(CMDMode::Open) => "Open: ",
                None => "> ",
            };
            let line = Line::from(vec![prompt.bold(), uidata.cmdinput.input.as_str().into()]);
            frame.render_widget(Paragraph::new(line), area);

            let x = area.x + (prompt.chars().count() + uidata.cmdinput.cursor) as u16;
            frame.set_cursor_position(Position::new(
                x.min(area.right().saturating_sub(1)),
                area.y,
            ));
        } else {
            frame.render_widget(
                Paragraph::new(uidata.status_message.as_str().dim()),
                area,
            );
        }
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = Self::popup_area(frame.area(), 50, 70);
        frame.render_widget(Clear, area);
        let popup = Paragraph::new(uidata.popup_message.as_str()).block(
            Block::bordered()
                .title(Line::from(" Help ".bold()).centered())
                .border_set(border::THICK),
        );
        frame.render_widget(popup, area);
    }

    fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
        let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
            .flex(Flex::Center)
            .areas(area);
        let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
            .flex(Flex::Center)
            .areas(area);
        area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{PALETTE, Point, Series};
    use ratatui::{Terminal, backend::TestBackend};

    fn sample_uidata() -> UIData {
        let mut uidata = UIData::empty();
        uidata.name = "cities.csv".into();
        uidata.title = "Data Dashboard".into();
        uidata.series = vec![Series {
            name: "Data".into(),
            color: PALETTE[0],
            points: vec![
                Point {
                    label: "NYC".into(),
                    value: 2,
                    color: PALETTE[0],
                },
                Point {
                    label: "LA".into(),
                    value: 1,
                    color: PALETTE[1],
                },
            ],
        }];
        uidata.total = 3;
        uidata.stats = "Total: 3".into();
        uidata.controls = "Column: City | Relation: Dept".into();
        uidata.status_message = "Loaded cities.csv (3 records)".into();
        uidata
    }

    fn rendered_text(uidata: &UIData) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let ui = DashboardUI::new();
        terminal.draw(|frame| ui.draw(uidata, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn draw_shows_title_stats_and_bars() {
        let text = rendered_text(&sample_uidata());

        assert!(text.contains("Data Dashboard"));
        assert!(text.contains("cities.csv"));
        assert!(text.contains("Total: 3"));
        assert!(text.contains("NYC"));
        assert!(text.contains("Column: City"));
    }

    #[test]
    fn draw_handles_the_empty_state() {
        let mut uidata = UIData::empty();
        uidata.title = "Data Dashboard".into();
        uidata.stats = "Total: 0".into();
        let text = rendered_text(&uidata);

        assert!(text.contains("No bars to display"));
        assert!(text.contains("Total: 0"));
    }

    #[test]
    fn draw_shows_the_help_popup() {
        let mut uidata = sample_uidata();
        uidata.show_popup = true;
        uidata.popup_message = "popup help text".into();
        let text = rendered_text(&uidata);

        assert!(text.contains("popup help text"));
    }
}
