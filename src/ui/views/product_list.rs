use crate::catalog::Product;
use crate::controller::{CatalogController, Screen};
use crate::ui::renderfns::{format_price, truncate};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

/// Draw whatever the main area should show for the current screen
pub fn draw_product_list(frame: &mut Frame, area: Rect, controller: &CatalogController) {
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  match controller.screen() {
    Screen::Error(error) => {
      let text = vec![
        Line::styled("Error fetching products", Style::default().fg(Color::Red).bold()),
        Line::raw(""),
        Line::styled(error.to_string(), Style::default().fg(Color::Red)),
      ];
      let paragraph = Paragraph::new(text)
        .block(block.border_style(Style::default().fg(Color::Red)))
        .wrap(Wrap { trim: true })
        .centered();
      frame.render_widget(paragraph, area);
    }
    Screen::Loading => {
      let paragraph = Paragraph::new("Loading...")
        .block(block)
        .style(Style::default().fg(Color::DarkGray))
        .centered();
      frame.render_widget(paragraph, area);
    }
    Screen::Empty => {
      let paragraph = Paragraph::new("NO RESULTS FOUND")
        .block(block)
        .style(Style::default().fg(Color::DarkGray))
        .centered();
      frame.render_widget(paragraph, area);
    }
    Screen::Results(products) => {
      let first = controller.skip() + 1;
      let last = controller.skip() + products.len();
      let title = match controller.debounced_search() {
        "" => format!(" Products {}-{} ", first, last),
        term => format!(" \"{}\" {}-{} ", truncate(term, 30), first, last),
      };
      draw_table(
        frame,
        area,
        block.title(title),
        products,
        controller.selected(),
      );
    }
  }
}

fn draw_table(frame: &mut Frame, area: Rect, block: Block, products: &[Product], selected: usize) {
  let header = Row::new(["Thumbnail", "Name", "Price"])
    .style(Style::default().fg(Color::White).bold())
    .bottom_margin(1);

  // Width left for the name after the fixed columns, borders and highlight symbol
  let name_width = area.width.saturating_sub(12 + 14 + 8) as usize;

  let rows = products.iter().map(|product| {
    Row::new(vec![
      thumbnail_cell(product),
      Cell::from(truncate(&product.title, name_width.max(8))),
      Cell::from(format_price(product.price)),
    ])
  });

  let table = Table::new(
    rows,
    [
      Constraint::Length(12),
      Constraint::Min(10),
      Constraint::Length(14),
    ],
  )
  .header(header)
  .block(block)
  .row_highlight_style(
    Style::default()
      .bg(Color::DarkGray)
      .add_modifier(Modifier::BOLD),
  )
  .highlight_symbol("> ");

  let mut state = TableState::default().with_selected(Some(selected));
  frame.render_stateful_widget(table, area, &mut state);
}

fn thumbnail_cell(product: &Product) -> Cell<'static> {
  match product.thumbnail() {
    Some(_) => Cell::from(Span::styled("[image]", Style::default().fg(Color::Green))),
    None => Cell::from(Span::styled("NO IMAGE", Style::default().fg(Color::DarkGray))),
  }
}
