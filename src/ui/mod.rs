pub mod components;
pub mod renderfns;
mod views;

use crate::app::{App, Focus};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use renderfns::{draw_footer, draw_header, draw_pagination, Pager};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let controller = app.controller();

  let [header, search, status, main, pager, footer] = Layout::vertical([
    Constraint::Length(1), // Header
    Constraint::Length(3), // Search box
    Constraint::Length(1), // Status line
    Constraint::Min(3),    // Products
    Constraint::Length(1), // Pagination
    Constraint::Length(1), // Shortcuts
  ])
  .areas(frame.area());

  let cart = controller.cart_summary();
  draw_header(
    frame,
    header,
    app.title(),
    app.api_url(),
    &controller.path(),
    &cart,
  );

  let busy = controller.is_debouncing() || controller.is_searching();
  app.search().render(frame, search, busy);

  draw_status_line(frame, status, app);
  views::draw_product_list(frame, main, controller);

  draw_pagination(
    frame,
    pager,
    Pager {
      page: controller.page(),
      can_go_previous: controller.can_go_previous(),
      can_go_next: controller.can_go_next(),
    },
  );
  draw_footer(frame, footer, &app.shortcuts());

  // Overlays last so they sit on top
  if let Some(product) = controller.detail() {
    views::draw_product_detail(frame, main, product);
  } else if controller.is_cart_open() {
    let below_header = Rect {
      y: header.bottom(),
      height: frame.area().height.saturating_sub(header.height + 2),
      ..frame.area()
    };
    views::draw_cart_popover(
      frame,
      below_header,
      controller.cart_items(),
      &cart,
      controller.cart_selected(),
    );
  }
}

fn draw_status_line(frame: &mut Frame, area: Rect, app: &App) {
  let controller = app.controller();

  let line = if app.focus() == Focus::GoTo {
    Line::from(vec![
      Span::styled(" Go to: ", Style::default().fg(Color::Yellow)),
      Span::raw(app.goto_input().value()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ])
  } else if controller.is_searching() {
    Line::styled(" searching...", Style::default().fg(Color::Yellow))
  } else if controller.is_fetching() {
    Line::styled(" loading...", Style::default().fg(Color::DarkGray))
  } else if !controller.search_text().is_empty() {
    Line::from(vec![
      Span::styled(" <x>", Style::default().fg(Color::Cyan)),
      Span::styled(" clear search", Style::default().fg(Color::DarkGray)),
    ])
  } else {
    Line::default()
  };

  frame.render_widget(Paragraph::new(line), area);
}
