use crate::cart::{CartLineItem, CartSummary};
use crate::ui::renderfns::{format_price, truncate};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Cart contents, anchored under the header's cart trigger
pub fn draw_cart_popover(
  frame: &mut Frame,
  area: Rect,
  items: &[CartLineItem],
  summary: &CartSummary,
  selected: usize,
) {
  let width = area.width.min(56);
  let height = (items.len().max(1) as u16 + 2).min(area.height);
  let popover = Rect::new(area.right().saturating_sub(width), area.y, width, height);
  frame.render_widget(Clear, popover);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
    .title(format!(" Cart · {} ", format_price(summary.total)))
    .title_bottom(
      Line::from(vec![
        Span::styled("<d>", Style::default().fg(Color::Cyan)),
        Span::styled(" remove  ", Style::default().fg(Color::DarkGray)),
        Span::styled("<C>", Style::default().fg(Color::Cyan)),
        Span::styled(" clear ", Style::default().fg(Color::DarkGray)),
      ])
      .right_aligned(),
    );

  if items.is_empty() {
    let paragraph = Paragraph::new("NO ITEMS IN CART")
      .block(block)
      .style(Style::default().fg(Color::DarkGray))
      .centered();
    frame.render_widget(paragraph, popover);
    return;
  }

  let name_width = (width as usize).saturating_sub(24);
  let list_items: Vec<ListItem> = items
    .iter()
    .map(|item| {
      ListItem::new(Line::from(vec![
        Span::styled(
          format!("{:>3}x ", item.quantity),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!(
          "{:<width$}",
          truncate(&item.product.title, name_width),
          width = name_width
        )),
        Span::styled(
          format!(" {:>12}", format_price(item.subtotal())),
          Style::default().fg(Color::Yellow),
        ),
      ]))
    })
    .collect();

  let list = List::new(list_items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default().with_selected(Some(selected));
  frame.render_stateful_widget(list, popover, &mut state);
}
