use super::control_style;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// State of the pager under the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
  pub page: u32,
  pub can_go_previous: bool,
  pub can_go_next: bool,
}

/// Draw "<p> ←  Page n  → <n>", dimming the arrows that do nothing
pub fn draw_pagination(frame: &mut Frame, area: Rect, pager: Pager) {
  frame.render_widget(Paragraph::new(pager_line(pager)).right_aligned(), area);
}

fn pager_line(pager: Pager) -> Line<'static> {
  let previous = control_style(pager.can_go_previous);
  let next = control_style(pager.can_go_next);

  Line::from(vec![
    Span::styled("<p> ←", previous),
    Span::raw("   Page "),
    Span::styled(pager.page.to_string(), Style::default().bold()),
    Span::raw("   "),
    Span::styled("→ <n>", next),
    Span::raw(" "),
  ])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pager_line_dims_disabled_controls() {
    let line = pager_line(Pager {
      page: 1,
      can_go_previous: false,
      can_go_next: true,
    });

    assert_eq!(line.spans[0].style.fg, Some(Color::DarkGray));
    assert_eq!(line.spans[2].content, "1");
    assert_eq!(line.spans[4].style.fg, Some(Color::Cyan));
  }
}
