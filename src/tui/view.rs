use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::DisplayState;
use crate::kit::PadMode;

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // status
            Constraint::Length(3), // sentence bar
            Constraint::Min(8),    // pad grid
        ])
        .split(area);

    draw_status(frame, sections[0], state);
    draw_sentence(frame, sections[1], state);
    draw_grid(frame, sections[2], state);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let flags = format!(
        "[{}] scene {}/{}  gap {}ms  compose:{}  tts:{}  {}",
        state.group_name,
        state.scene + 1,
        state.num_scenes,
        state.gap_ms,
        if state.compose { "on" } else { "off" },
        if state.tts { "on" } else { "off" },
        if state.playing { "▶ playing" } else { "stopped" },
    );
    let mut lines = vec![Line::from(flags)];
    if let Some(status) = &state.status {
        lines.push(Line::from(status.clone()).style(Style::default().fg(Color::Red)));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_sentence(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let text = if state.sentence.is_empty() { "(empty sentence)" } else { &state.sentence };
    let block = Block::default().borders(Borders::ALL).title("sentence");
    frame.render_widget(Paragraph::new(text.to_string()).block(block), area);
}

fn draw_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    if state.rows == 0 || state.cols == 0 {
        return;
    }
    let row_constraints = vec![Constraint::Ratio(1, state.rows as u32); state.rows];
    let col_constraints = vec![Constraint::Ratio(1, state.cols as u32); state.cols];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (row_index, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints.clone())
            .split(*row_area);

        for (col_index, cell_area) in cols.iter().enumerate() {
            let index = row_index * state.cols + col_index;
            let Some(cell) = state.cells.get(index) else { continue };

            let style = if cell.recording {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else if cell.has_audio {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let tag = match cell.mode {
                PadMode::Retrigger => "",
                PadMode::ToggleStart => " ⟳",
                PadMode::ToggleResume => " ⏯",
                PadMode::Record => " ●",
            };
            let block = Block::default().borders(Borders::ALL).border_style(style);
            let label = format!("{}{}", cell.name, tag);
            frame.render_widget(
                Paragraph::new(label).style(style).block(block),
                *cell_area,
            );
        }
    }
}
