use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::ai::discover_with_gemini;
use crate::models::{Category, Citation, Offer, OfferStatus};
use crate::store::{filter_offers, OfferFilter, OfferStore};

struct AppState {
    store: OfferStore,
    filter: OfferFilter,
    model_id: String,
    /// Filtered, sorted snapshot the panes render from.
    rows: Vec<Offer>,
    selected: usize,
    scroll_offset: u16,
    links: Vec<Citation>,
    notice: Option<String>,
    editing: bool,
}

impl AppState {
    fn new(store: OfferStore, filter: OfferFilter, model_id: String, today: NaiveDate) -> Self {
        let mut state = Self {
            store,
            filter,
            model_id,
            rows: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            links: Vec::new(),
            notice: None,
            editing: false,
        };
        state.refresh(today);
        state
    }

    fn refresh(&mut self, today: NaiveDate) {
        self.rows = filter_offers(self.store.all(), &self.filter, today)
            .into_iter()
            .cloned()
            .collect();
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    fn current_offer(&self) -> Option<&Offer> {
        self.rows.get(self.selected)
    }

    fn next(&mut self) {
        if !self.rows.is_empty() && self.selected < self.rows.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn approve_selected(&mut self, today: NaiveDate) {
        let Some(offer) = self.current_offer() else { return };
        let id = offer.id.clone();
        let name = offer.tool_name.clone();
        if self.store.update_status(&id, OfferStatus::Approved, today) {
            self.notice = Some(format!("Verified {}", name));
        }
        self.refresh(today);
    }

    fn run_discovery(&mut self, today: NaiveDate) {
        let query = self.filter.text.trim().to_string();
        if query.is_empty() {
            self.notice = Some("Type a query first (press /)".to_string());
            return;
        }

        let discovery = discover_with_gemini(&self.model_id, &query, today);
        // Each call's sources replace the previous batch wholesale.
        self.links = discovery.links;
        let added = self.store.absorb_discovery(discovery.offers, today);
        self.notice = Some(match discovery.diagnostic {
            Some(cause) => format!("Discovery came back empty: {}", cause),
            None => format!("Added {} offer(s) from {} source(s)", added, self.links.len()),
        });
        self.refresh(today);
    }
}

pub fn run_browse(store: OfferStore, filter: OfferFilter, model_id: String) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let mut state = AppState::new(store, filter, model_id, today);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        list_state.select(if state.rows.is_empty() {
            None
        } else {
            Some(state.selected)
        });
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let today = chrono::Local::now().date_naive();
            state.notice = None;

            if state.editing {
                match key.code {
                    KeyCode::Esc => state.editing = false,
                    KeyCode::Enter => {
                        state.editing = false;
                        // One foreground task: the UI blocks until the call
                        // completes, so re-submission cannot happen mid-flight.
                        state.notice = Some("Searching...".to_string());
                        terminal.draw(|frame| draw(frame, state, &mut list_state))?;
                        state.run_discovery(today);
                    }
                    KeyCode::Backspace => {
                        state.filter.text.pop();
                        state.refresh(today);
                    }
                    KeyCode::Char(c) => {
                        state.filter.text.push(c);
                        state.refresh(today);
                    }
                    _ => {}
                }
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('/') => state.editing = true,
                KeyCode::Char('c') => {
                    state.filter.category = cycle_category(state.filter.category);
                    state.refresh(today);
                }
                KeyCode::Char('t') => {
                    state.filter.recency_days = match state.filter.recency_days {
                        Some(_) => None,
                        None => Some(30),
                    };
                    state.refresh(today);
                }
                KeyCode::Char('a') => {
                    state.filter.include_unapproved = !state.filter.include_unapproved;
                    state.refresh(today);
                }
                KeyCode::Char('v') => state.approve_selected(today),
                _ => {}
            }
        }
    }
    Ok(())
}

fn cycle_category(current: Option<Category>) -> Option<Category> {
    match current {
        None => Some(Category::ALL[0]),
        Some(cat) => {
            let idx = Category::ALL.iter().position(|c| *c == cat).unwrap_or(0);
            Category::ALL.get(idx + 1).copied()
        }
    }
}

fn status_icon(status: OfferStatus) -> &'static str {
    match status {
        OfferStatus::Approved => "+",
        OfferStatus::Pending => "*",
        OfferStatus::Expired => "-",
        OfferStatus::Rejected => "x",
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let links_height = if state.links.is_empty() {
        0
    } else {
        state.links.len().min(4) as u16 + 2
    };
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(links_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Search bar
    let search_style = if state.editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search = Paragraph::new(state.filter.text.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(search_style)
            .title(" Search (Enter: discover with AI) "),
    );
    frame.render_widget(search, outer[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(outer[1]);

    // Left panel: offer list
    let items: Vec<ListItem> = state
        .rows
        .iter()
        .map(|offer| {
            let name = if offer.tool_name.len() > 24 {
                format!("{}...", &offer.tool_name[..21])
            } else {
                offer.tool_name.clone()
            };
            ListItem::new(format!(
                "{} {} | {}",
                status_icon(offer.status),
                name,
                offer.category.label()
            ))
        })
        .collect();

    let category_label = state
        .filter
        .category
        .map(|c| c.label())
        .unwrap_or("All");
    let window_label = match state.filter.recency_days {
        Some(days) => format!("{}d", days),
        None => "all time".to_string(),
    };
    let admin_label = if state.filter.include_unapproved {
        " admin"
    } else {
        ""
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Offers ({}/{}) | {} | {}{} ",
            state.rows.len(),
            state.store.len(),
            category_label,
            window_label,
            admin_label
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: offer detail
    let detail = build_detail(state);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Sources from the last discovery call
    if !state.links.is_empty() {
        let link_items: Vec<ListItem> = state
            .links
            .iter()
            .map(|link| ListItem::new(format!("{} - {}", link.title, link.uri)))
            .collect();
        let link_list = List::new(link_items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Sources ({}) ", state.links.len())),
        );
        frame.render_widget(link_list, outer[2]);
    }

    // Footer: notice when present, key help otherwise
    let footer = match &state.notice {
        Some(notice) => Paragraph::new(format!(" {}", notice)).style(Style::default().fg(Color::Yellow)),
        None => Paragraph::new(
            " j/k:navigate  J/K:scroll  /:search  c:category  t:30-day  a:admin  v:verify  q:quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, outer[3]);
}

fn build_detail<'a>(state: &'a AppState) -> Text<'a> {
    let Some(offer) = state.current_offer() else {
        return Text::raw("No offers match the current filters");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &offer.tool_name,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!(
        "{} | {}",
        offer.category.label(),
        offer.offer_type.label()
    )));

    let status_style = match offer.status {
        OfferStatus::Approved => Style::default().fg(Color::Green),
        OfferStatus::Pending => Style::default().fg(Color::Yellow),
        OfferStatus::Expired => Style::default().fg(Color::DarkGray),
        OfferStatus::Rejected => Style::default().fg(Color::Red),
    };
    lines.push(Line::from(Span::styled(
        format!("Status: {}", offer.status.label()),
        status_style,
    )));

    if offer.is_trending {
        lines.push(Line::from(Span::styled(
            "Trending",
            Style::default().fg(Color::Cyan),
        )));
    }

    lines.push(Line::from(format!("Verified: {}", offer.last_verified_date)));
    if let Some(expiry) = offer.expiry_date {
        lines.push(Line::from(format!("Expires: {}", expiry)));
    }
    if let Some(code) = &offer.promo_code {
        lines.push(Line::from(Span::styled(
            format!("Code: {}", code),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(format!("URL: {}", offer.source_url)));

    lines.push(Line::from(""));
    for line in textwrap::fill(&offer.description, 70).lines() {
        lines.push(Line::from(line.to_string()));
    }

    Text::from(lines)
}
