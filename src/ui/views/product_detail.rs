use crate::catalog::Product;
use crate::ui::renderfns::{centered_rect, format_price};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Images listed in the detail modal
const MAX_IMAGES: usize = 4;

/// Modal with the full product and an add-to-cart hint
pub fn draw_product_detail(frame: &mut Frame, area: Rect, product: &Product) {
  let modal = centered_rect(70, 70, area);
  frame.render_widget(Clear, modal);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
    .title(format!(" #{} ", product.id))
    .title_bottom(
      Line::from(vec![
        Span::styled("<a>", Style::default().fg(Color::Cyan)),
        Span::styled(" add to cart  ", Style::default().fg(Color::DarkGray)),
        Span::styled("<esc>", Style::default().fg(Color::Cyan)),
        Span::styled(" close ", Style::default().fg(Color::DarkGray)),
      ])
      .right_aligned(),
    );

  let paragraph = Paragraph::new(detail_lines(product))
    .block(block)
    .wrap(Wrap { trim: false });
  frame.render_widget(paragraph, modal);
}

fn detail_lines(product: &Product) -> Vec<Line<'_>> {
  let mut lines = Vec::new();

  if let Some(category) = &product.category {
    lines.push(Line::styled(
      category.to_uppercase(),
      Style::default().fg(Color::DarkGray),
    ));
  }
  lines.push(Line::styled(
    product.title.as_str(),
    Style::default().fg(Color::White).bold(),
  ));
  lines.push(Line::raw(""));

  if let Some(description) = &product.description {
    lines.push(Line::raw(description.as_str()));
    lines.push(Line::raw(""));
  }

  lines.push(Line::styled(
    format_price(product.price),
    Style::default().fg(Color::Yellow).bold(),
  ));
  lines.push(Line::raw(""));

  lines.push(Line::styled("MORE IMAGES", Style::default().bold()));
  if product.images.is_empty() {
    lines.push(Line::styled(
      "NO AVAILABLE IMAGES",
      Style::default().fg(Color::DarkGray),
    ));
  } else {
    lines.extend(
      product
        .images
        .iter()
        .take(MAX_IMAGES)
        .map(|url| Line::styled(format!("  {}", url), Style::default().fg(Color::Blue))),
    );
  }

  lines
}
