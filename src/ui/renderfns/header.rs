use super::format_price;
use crate::cart::CartSummary;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar: title, catalog host, route, cart trigger
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  api_url: &str,
  path: &str,
  cart: &CartSummary,
) {
  let left = Line::from(vec![
    Span::styled(format!(" {} ", title), Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", extract_domain(api_url)),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", path), Style::default().fg(Color::Yellow).bold()),
  ]);

  let right = Line::from(vec![
    Span::styled("<c>", Style::default().fg(Color::Cyan)),
    Span::styled(" CHECK CART ", Style::default().fg(Color::White).bold()),
    Span::styled(cart_label(cart), Style::default().fg(Color::DarkGray)),
  ])
  .right_aligned();

  let style = Style::default().bg(Color::Black);
  frame.render_widget(Paragraph::new(left).style(style), area);
  frame.render_widget(Paragraph::new(right).style(style), area);
}

fn cart_label(cart: &CartSummary) -> String {
  match cart.quantity {
    0 => "(empty) ".to_string(),
    1 => format!("(1 item, {}) ", format_price(cart.total)),
    n => format!("({} items, {}) ", n, format_price(cart.total)),
  }
}

/// Host part of the catalog URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
