// Keyboard → semantic events. Grid keys mirror a 4x4 pad layout
// (1234 / qwer / asdf / zxcv); shifted grid keys toggle recording on the
// same pad. Everything else is transport and scene navigation.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::UiEvent;

pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<UiEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<UiEvent> {
    match code {
        KeyCode::Esc => vec![UiEvent::Quit],
        KeyCode::Char(' ') => vec![UiEvent::Play],
        KeyCode::Tab => vec![UiEvent::CycleGroup],
        KeyCode::Backspace => vec![UiEvent::PopToken],
        KeyCode::Delete => vec![UiEvent::ClearSentence],

        KeyCode::Char('p') => vec![UiEvent::PlayChain],
        KeyCode::Char('m') => vec![UiEvent::ToggleCompose],
        KeyCode::Char('o') => vec![UiEvent::ToggleTts],
        KeyCode::Char('g') => vec![UiEvent::ScenePrev],
        KeyCode::Char('h') => vec![UiEvent::SceneNext],

        KeyCode::Char(c) => match grid_key(c.to_ascii_lowercase()) {
            Some(index) => vec![UiEvent::Pad { index, record: c.is_ascii_uppercase() }],
            None => vec![],
        },
        _ => vec![],
    }
}

// grid key → (row, col) in a 4-wide layout; the caller re-maps to the
// actual group dimensions
fn grid_key(c: char) -> Option<usize> {
    let index = match c {
        '1' => 0, '2' => 1, '3' => 2, '4' => 3,
        'q' => 4, 'w' => 5, 'e' => 6, 'r' => 7,
        'a' => 8, 's' => 9, 'd' => 10, 'f' => 11,
        'z' => 12, 'x' => 13, 'c' => 14, 'v' => 15,
        _ => return None,
    };
    Some(index)
}

// A 4-wide key position remapped into a rows×cols group; None when the
// position falls outside the group.
pub fn remap_grid(index: usize, rows: usize, cols: usize) -> Option<usize> {
    let (row, col) = (index / 4, index % 4);
    if row < rows && col < cols {
        Some(row * cols + col)
    } else {
        None
    }
}
