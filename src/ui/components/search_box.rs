use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Events emitted by the search box that the app needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Text changed (on each edit)
  Changed(String),
  /// Ctrl-U: text emptied, search should end right away
  Cleared,
  /// Enter or Esc: focus leaves the box, text stays
  Closed,
}

/// Search box shown above the product list.
///
/// The box is always visible; it only takes keys while focused.
#[derive(Debug, Clone, Default)]
pub struct SearchBox {
  input: TextInput,
  focused: bool,
}

impl SearchBox {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_focused(&self) -> bool {
    self.focused
  }

  pub fn query(&self) -> &str {
    self.input.value()
  }

  pub fn focus(&mut self) {
    self.focused = true;
  }

  /// Empty the box without emitting anything
  pub fn clear(&mut self) {
    self.input.clear();
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.focused {
      return KeyResult::NotHandled;
    }

    if key.code == KeyCode::Char('u') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.input.clear();
      return KeyResult::Event(SearchEvent::Cleared);
    }

    match self.input.handle_key(key) {
      InputResult::Changed => KeyResult::Event(SearchEvent::Changed(self.query().to_string())),
      InputResult::Submitted(_) | InputResult::Cancelled => {
        self.focused = false;
        KeyResult::Event(SearchEvent::Closed)
      }
      InputResult::Consumed => KeyResult::Handled,
      // Swallow everything else so typing never triggers list shortcuts
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the box. `busy` adds a marker while the term is settling or
  /// results are on their way.
  pub fn render(&self, frame: &mut Frame, area: Rect, busy: bool) {
    let border = if self.is_focused() {
      Color::Yellow
    } else {
      Color::DarkGray
    };

    let mut title = vec![Span::raw(" Search ")];
    if busy {
      title.push(Span::styled("… ", Style::default().fg(Color::Yellow)));
    }

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border))
      .title(Line::from(title));

    let line = if self.input.is_empty() && !self.focused {
      Line::from(Span::styled(
        "Press / to search products",
        Style::default().fg(Color::DarkGray),
      ))
    } else {
      Line::from(vec![
        Span::styled("/", Style::default().fg(Color::Yellow)),
        Span::raw(self.query()),
      ])
    };

    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(line).block(block), area);

    if self.focused && inner.width > 1 {
      // "/" prefix plus the text before the cursor
      let offset = 1 + self.input.cursor_position() as u16;
      frame.set_cursor_position((inner.x + offset.min(inner.width - 1), inner.y));
    }
  }
}
