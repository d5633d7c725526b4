use crate::cart::{CartStore, MemoryStorage, SqliteStorage};
use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::controller::{CatalogController, ControllerSettings};
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{InputResult, KeyResult, SearchBox, SearchEvent, TextInput};
use crate::ui::renderfns::Shortcut;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Where key presses go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  /// List shortcuts (and the open overlay, if any)
  Normal,
  /// Typing into the search box
  Search,
  /// Typing a path for the go-to prompt
  GoTo,
}

/// Main application state
pub struct App {
  controller: CatalogController,

  /// Header text
  title: String,
  api_url: String,

  focus: Focus,
  search: SearchBox,
  goto: TextInput,

  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, initial_route: &str) -> Result<Self> {
    let catalog = Arc::new(CatalogClient::new(config)?);
    let controller = CatalogController::new(
      catalog,
      open_cart(config),
      ControllerSettings::from(config),
      initial_route,
    );

    Ok(Self::with_controller(
      controller,
      config.title(),
      &config.catalog.base_url,
    ))
  }

  pub fn with_controller(controller: CatalogController, title: &str, api_url: &str) -> Self {
    Self {
      controller,
      title: title.to_string(),
      api_url: api_url.to_string(),
      focus: Focus::Normal,
      search: SearchBox::new(),
      goto: TextInput::new(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even when the loop failed; the loop's error wins
    self.controller.shutdown();
    let cleanup = restore_terminal();
    first_error(result, cleanup)
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    info!(path = %self.controller.path(), "started");

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    info!("quitting");
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        self.controller.tick();
      }
      Event::Resize => {}
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.focus {
      Focus::Normal => self.handle_normal_key(key),
      Focus::Search => self.handle_search_key(key),
      Focus::GoTo => self.handle_goto_key(key),
    }
  }

  fn handle_search_key(&mut self, key: KeyEvent) {
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(text)) => self.controller.set_search_text(&text),
      KeyResult::Event(SearchEvent::Cleared) => self.controller.clear_search(),
      KeyResult::Event(SearchEvent::Closed) => self.focus = Focus::Normal,
      KeyResult::Handled => {}
      KeyResult::NotHandled => self.focus = Focus::Normal,
    }
  }

  fn handle_goto_key(&mut self, key: KeyEvent) {
    match self.goto.handle_key(key) {
      InputResult::Submitted(path) => {
        self.focus = Focus::Normal;
        let path = path.trim();
        if !path.is_empty() {
          self.controller.navigate(path);
        }
      }
      InputResult::Cancelled => self.focus = Focus::Normal,
      InputResult::Changed | InputResult::Consumed | InputResult::NotHandled => {}
    }
  }

  fn handle_normal_key(&mut self, key: KeyEvent) {
    if self.controller.detail().is_some() {
      self.handle_detail_key(key);
      return;
    }
    if self.controller.is_cart_open() {
      self.handle_cart_key(key);
      return;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,

      // Search
      KeyCode::Char('/') => {
        self.search.focus();
        self.focus = Focus::Search;
      }
      KeyCode::Char('u') if ctrl => self.clear_search(),
      KeyCode::Char('x') => self.clear_search(),

      // Selection
      KeyCode::Up | KeyCode::Char('k') => self.controller.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.controller.move_selection(1),
      KeyCode::Enter => self.controller.open_detail(),
      KeyCode::Char('a') => self.add_selected_to_cart(),

      // Paging and history
      KeyCode::Right | KeyCode::Char('n') => self.controller.next_page(),
      KeyCode::Left | KeyCode::Char('p') => self.controller.previous_page(),
      KeyCode::Char('b') => self.controller.back(),
      KeyCode::Char('r') => self.controller.reload(),
      KeyCode::Char('g') => {
        self.goto = TextInput::with_value(&self.controller.path());
        self.focus = Focus::GoTo;
      }

      // Cart
      KeyCode::Char('c') => self.controller.toggle_cart(),
      KeyCode::Char('C') => self.controller.clear_cart(),

      _ => {}
    }
  }

  fn handle_detail_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('a') => self.controller.add_detail_to_cart(),
      KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => self.controller.close_detail(),
      _ => {}
    }
  }

  fn handle_cart_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Up | KeyCode::Char('k') => self.controller.move_cart_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.controller.move_cart_selection(1),
      KeyCode::Char('d') | KeyCode::Delete => self.controller.remove_selected_cart_item(),
      KeyCode::Char('C') => self.controller.clear_cart(),
      KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('c') => self.controller.close_cart(),
      _ => {}
    }
  }

  fn clear_search(&mut self) {
    self.search.clear();
    self.controller.clear_search();
  }

  fn add_selected_to_cart(&mut self) {
    let selected = self
      .controller
      .display_products()
      .and_then(|products| products.get(self.controller.selected()))
      .cloned();
    if let Some(product) = selected {
      self.controller.add_to_cart(&product);
    }
  }

  // Accessors for UI rendering
  pub fn controller(&self) -> &CatalogController {
    &self.controller
  }

  pub fn focus(&self) -> Focus {
    self.focus
  }

  pub fn search(&self) -> &SearchBox {
    &self.search
  }

  pub fn goto_input(&self) -> &TextInput {
    &self.goto
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  #[cfg(test)]
  fn should_quit(&self) -> bool {
    self.should_quit
  }

  /// Hints for the footer, depending on what has the keyboard
  pub fn shortcuts(&self) -> Vec<Shortcut> {
    match self.focus {
      Focus::Search => vec![
        Shortcut::new("enter", "done"),
        Shortcut::new("ctrl-u", "clear"),
      ],
      Focus::GoTo => vec![Shortcut::new("enter", "go"), Shortcut::new("esc", "cancel")],
      Focus::Normal if self.controller.detail().is_some() => vec![
        Shortcut::new("a", "add to cart"),
        Shortcut::new("esc", "close"),
      ],
      Focus::Normal if self.controller.is_cart_open() => vec![
        Shortcut::new("j/k", "select"),
        Shortcut::new("d", "remove"),
        Shortcut::new("C", "clear"),
        Shortcut::new("esc", "close"),
      ],
      Focus::Normal => {
        let mut shortcuts = vec![
          Shortcut::new("/", "search"),
          Shortcut::new("x", "clear"),
          Shortcut::new("j/k", "select"),
          Shortcut::new("enter", "details"),
          Shortcut::new("a", "add"),
          Shortcut::new("c", "cart"),
        ];
        if self.controller.can_go_back() {
          shortcuts.push(Shortcut::new("b", "back"));
        }
        shortcuts.extend([
          Shortcut::new("g", "go to"),
          Shortcut::new("r", "reload"),
          Shortcut::new("q", "quit"),
        ]);
        shortcuts
      }
    }
  }
}

/// Leave raw mode and the alternate screen. Both steps run even if the first
/// fails; the first error is returned.
fn restore_terminal() -> Result<()> {
  let raw = disable_raw_mode();
  let screen = stdout().execute(LeaveAlternateScreen).map(|_| ());
  raw?;
  screen?;
  Ok(())
}

/// `result` if it failed, otherwise `cleanup`.
fn first_error(result: Result<()>, cleanup: Result<()>) -> Result<()> {
  result?;
  cleanup
}

/// The SQLite-backed cart, or an in-memory one when the database can't be
/// opened so the catalog stays usable.
fn open_cart(config: &Config) -> CartStore {
  let opened = config
    .cart_path()
    .and_then(|path| SqliteStorage::open(&path));

  match opened {
    Ok(storage) => CartStore::new(storage),
    Err(e) => {
      warn!(error = %e, "cart database unavailable, keeping the cart in memory");
      CartStore::new(MemoryStorage::new())
    }
  }
}
