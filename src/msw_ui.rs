use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Terminal;
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};

use crate::msw_board::CellContent;
use crate::msw_color::TermTone;
use crate::msw_conf::{save_config, Config, Difficulty};
use crate::msw_session::{CellState, GameSession, RenderEvent};
use unicode_width::UnicodeWidthStr;

// Group runtime UI variables into a single structure to simplify passing them around
struct UiState {
    // cursor position in cell coords (row, col)
    cursor: (usize, usize),
    left_press: Option<(usize, usize)>,
    hover_index: Option<usize>,
    clicked_index: Option<usize>,
    click_instant: Option<Instant>,
    showing_difficulty: bool,
    showing_help: bool,
    showing_loss: bool,
    difficulty_selected: usize,
    // transient status-bar note (e.g. rejected difficulty for this grid)
    notice: Option<(String, Instant)>,
    // elapsed-time counter, owned entirely by the UI: runs from the first
    // reveal of a session until the session is lost or replaced
    timer_running: bool,
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl UiState {
    fn new() -> Self {
        UiState {
            cursor: (0, 0),
            left_press: None,
            hover_index: None,
            clicked_index: None,
            click_instant: None,
            showing_difficulty: false,
            showing_help: false,
            showing_loss: false,
            difficulty_selected: 0,
            notice: None,
            timer_running: false,
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    fn reset_after_new_game(&mut self) {
        self.left_press = None;
        self.showing_difficulty = false;
        self.showing_help = false;
        self.showing_loss = false;
        self.notice = None;
        self.timer_running = false;
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }

    fn start_timer(&mut self) {
        self.timer_running = true;
        self.start_time = Some(Instant::now());
    }

    fn stop_timer(&mut self) {
        if let Some(t0) = self.start_time {
            self.elapsed = t0.elapsed();
        }
        self.timer_running = false;
    }

    fn elapsed_secs(&self) -> u64 {
        if self.timer_running {
            self.start_time.map(|t0| t0.elapsed().as_secs()).unwrap_or(0)
        } else {
            self.elapsed.as_secs()
        }
    }
}

/// Drain session notifications; the board itself is redrawn from the cell
/// queries every frame, the events only matter for the loss transition.
fn drain_events(session: &mut GameSession, ui: &mut UiState) {
    for ev in session.take_events() {
        if ev == RenderEvent::Lost {
            ui.stop_timer();
            ui.showing_loss = true;
        }
    }
}

fn reveal_at(session: &mut GameSession, ui: &mut UiState, row: usize, col: usize) -> Result<(), Box<dyn Error>> {
    if !ui.timer_running && !session.lost() {
        ui.start_timer();
    }
    session.reveal(row, col)?;
    drain_events(session, ui);
    Ok(())
}

fn flag_at(session: &mut GameSession, ui: &mut UiState, row: usize, col: usize) -> Result<(), Box<dyn Error>> {
    session.toggle_flag(row, col)?;
    drain_events(session, ui);
    Ok(())
}

/// Start a fresh game with the mine count of the given difficulty. A mine
/// count the grid cannot hold leaves the running session untouched and
/// posts a status-bar note instead.
fn start_new_game(session: &mut GameSession, ui: &mut UiState, difficulty: Difficulty) {
    match session.new_game(difficulty.mine_count()) {
        Ok(()) => {
            drain_events(session, ui);
            ui.reset_after_new_game();
        }
        Err(e) => {
            ui.notice = Some((e.to_string(), Instant::now()));
        }
    }
}

/// Map a pointer position inside the board rect to cell coordinates.
/// Cells are two terminal columns wide.
fn cell_at(board_rect: Rect, column: u16, row: u16, session: &GameSession) -> Option<(usize, usize)> {
    let inner = Rect::new(
        board_rect.x + 1,
        board_rect.y + 1,
        board_rect.width.saturating_sub(2),
        board_rect.height.saturating_sub(2),
    );
    let inside = column >= inner.x
        && column <= inner.x + inner.width.saturating_sub(1)
        && row >= inner.y
        && row <= inner.y + inner.height.saturating_sub(1);
    if !inside {
        return None;
    }
    let cell_col = ((column - inner.x) / 2) as usize;
    let cell_row = (row - inner.y) as usize;
    if cell_row < session.rows() && cell_col < session.columns() {
        Some((cell_row, cell_col))
    } else {
        None
    }
}

pub fn run(cfg: &mut Config) -> Result<(), Box<dyn Error>> {
    let mut session = GameSession::new(cfg.rows, cfg.columns, cfg.difficulty.mine_count())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut ui = UiState::new();
    let mut menu_rect: Option<Rect> = None;
    let mut board_rect: Option<Rect> = None;
    let mut modal_rect: Option<Rect> = None;
    // Centralized menu/key items (key, rest). Esc lives in the status bar.
    let menu_items = [
        ("F1", "Help"),
        ("F2", "New"),
        ("F5", "Difficulty"),
        ("Esc", "Exit"),
    ];
    let difficulties = [Difficulty::Easy, Difficulty::Middle, Difficulty::Hard];

    // glyphs and colors
    let glyph_unopened = ("■", Color::Gray.tone());
    let glyph_mine = ("☼", Color::Black.tone());
    let glyph_flag = ("⚑", Color::Red.tone());
    let board_bg = Color::DarkGray.tone();
    let cursor_bg = Color::LightBlue.tone();
    let number_fg = Color::Blue.tone();
    let menu_key_fg = Color::Yellow.tone();
    let menu_key_bg_hover = Color::LightBlue.tone();
    let menu_key_bg_pressed = Color::Green.tone();
    let menu_key_fg_pressed = Color::Black.tone();

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| {
            let size = f.size();
            let min_twidth = (session.columns() as u16 * 2 + 6).max(60);
            let min_theight = session.rows() as u16 + 8;
            // If terminal too small, render a centered warning and skip normal UI
            if size.width < min_twidth || size.height < min_theight {
                let warn_lines = vec![
                    Spans::from(Span::raw("Terminal size too small.")),
                    Spans::from(Span::raw(format!("Minimum required: {} x {}", min_twidth, min_theight))),
                ];
                let warn = Paragraph::new(Text::from(warn_lines))
                    .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
                    .alignment(Alignment::Center);
                f.render_widget(Clear, size);
                let w = 40u16.min(size.width.saturating_sub(2));
                let h = 5u16.min(size.height.saturating_sub(2));
                f.render_widget(warn, center_rect(w, h, size));
                return;
            }

            // layout: top menu row, center board, bottom status
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(0)
                .constraints([Constraint::Length(3), Constraint::Min(6), Constraint::Length(3)].as_ref())
                .split(size);

            // menu row (per-item styled so hover/click mapping aligns with mouse offsets)
            let mut spans_vec: Vec<Span> = Vec::new();
            for (i, (label_key, label_rest)) in menu_items.iter().take(3).enumerate() {
                if i > 0 {
                    spans_vec.push(Span::raw("   "));
                }
                let (key_style, rest_style) = if Some(i) == ui.clicked_index {
                    (
                        Style::default().bg(menu_key_bg_pressed).fg(menu_key_fg_pressed).add_modifier(Modifier::BOLD),
                        Style::default().bg(menu_key_bg_pressed).fg(menu_key_fg_pressed),
                    )
                } else if Some(i) == ui.hover_index {
                    (
                        Style::default().bg(menu_key_bg_hover).fg(menu_key_fg_pressed).add_modifier(Modifier::BOLD),
                        Style::default().bg(menu_key_bg_hover).fg(menu_key_fg_pressed),
                    )
                } else {
                    (Style::default().fg(menu_key_fg).add_modifier(Modifier::BOLD), Style::default())
                };
                spans_vec.push(Span::styled(label_key.to_string(), key_style));
                spans_vec.push(Span::styled(format!(": {}", label_rest), rest_style));
            }
            spans_vec.insert(0, Span::raw(" "));
            spans_vec.push(Span::raw(" "));
            let menu = Paragraph::new(Spans::from(spans_vec))
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Left);
            f.render_widget(menu, chunks[0]);
            menu_rect = Some(chunks[0]);

            // status row (left info + right-aligned Esc: Exit)
            let left_text = match &ui.notice {
                Some((msg, t0)) if t0.elapsed() < Duration::from_secs(3) => format!(" {} ", msg),
                _ => format!(" Mines: {}   Time: {}s ", session.mine_count(), ui.elapsed_secs()),
            };
            let (esc_key, esc_rest) = menu_items[3];
            let inner_w = chunks[2].width.saturating_sub(2) as usize;
            let left_w = left_text.as_str().width();
            let right_w = esc_key.width() + 2 + esc_rest.width();
            let mid_spaces = if inner_w > left_w + right_w + 1 { inner_w - left_w - right_w - 1 } else { 1 };
            let status_spans = vec![
                Span::raw(left_text),
                Span::raw(" ".repeat(mid_spaces)),
                Span::styled(esc_key.to_string(), Style::default().fg(menu_key_fg).add_modifier(Modifier::BOLD)),
                Span::raw(format!(": {} ", esc_rest)),
            ];
            let status = Paragraph::new(Text::from(Spans::from(status_spans)))
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Left);
            f.render_widget(status, chunks[2]);

            // board area
            let board_area = center_rect((session.columns() as u16) * 2 + 3, session.rows() as u16 + 2, chunks[1]);
            board_rect = Some(board_area);
            let mut lines = vec![];
            for row in 0..session.rows() {
                let mut spans = vec![];
                for col in 0..session.columns() {
                    let mut s = glyph_unopened.0.to_string();
                    let mut style = Style::default().fg(glyph_unopened.1).bg(board_bg);
                    if ui.cursor == (row, col) {
                        style = style.bg(cursor_bg);
                    }
                    // cell queries: content is only consulted for revealed
                    // cells, hidden contents never reach the renderer
                    match session.cell_state(row, col).unwrap_or(CellState::Hidden) {
                        CellState::Revealed => match session.cell_content(row, col) {
                            Ok(CellContent::Mine) => {
                                s = glyph_mine.0.to_string();
                                style = style.fg(glyph_mine.1);
                            }
                            Ok(CellContent::Count(0)) | Err(_) => s = " ".to_string(),
                            Ok(CellContent::Count(n)) => {
                                s = format!("{}", n);
                                style = style.fg(number_fg);
                            }
                        },
                        CellState::Flagged => {
                            s = glyph_flag.0.to_string();
                            style = style.fg(glyph_flag.1);
                        }
                        CellState::Hidden => {}
                    }
                    // press feedback on the cell under the mouse button
                    if ui.left_press == Some((row, col))
                        && session.cell_state(row, col).unwrap_or(CellState::Hidden) == CellState::Hidden
                    {
                        style = style.bg(board_bg).fg(board_bg);
                    }
                    spans.push(Span::styled(format!(" {}", s), style));
                }
                spans.push(Span::styled(" ", Style::default().bg(board_bg)));
                lines.push(Spans::from(spans));
            }
            let board = Paragraph::new(Text::from(lines))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(cfg.difficulty.name())
                        .title_alignment(Alignment::Center),
                )
                .alignment(Alignment::Left);
            f.render_widget(board, board_area);

            // modals
            modal_rect = None;
            if ui.showing_difficulty {
                let mrect = center_rect(36, 7, size);
                modal_rect = Some(mrect);
                f.render_widget(Clear, mrect);
                f.render_widget(Block::default().borders(Borders::ALL).title("Difficulty"), mrect);
                let inner = Rect::new(mrect.x + 1, mrect.y + 1, mrect.width.saturating_sub(2), mrect.height.saturating_sub(2));
                let mut dlines = vec![Spans::from(Span::raw(""))];
                for (i, d) in difficulties.iter().enumerate() {
                    let mark = if i == ui.difficulty_selected { "*" } else { " " };
                    let line = format!(" {} {}) {:<8} {} mines", mark, i + 1, d.name(), d.mine_count());
                    if i == ui.difficulty_selected {
                        dlines.push(Spans::from(Span::styled(
                            line,
                            Style::default().bg(menu_key_bg_hover).fg(menu_key_fg_pressed).add_modifier(Modifier::BOLD),
                        )));
                    } else {
                        dlines.push(Spans::from(Span::raw(line)));
                    }
                }
                f.render_widget(Paragraph::new(Text::from(dlines)).alignment(Alignment::Left), inner);
            } else if ui.showing_help {
                let mrect = center_rect(44, 10, size);
                modal_rect = Some(mrect);
                f.render_widget(Clear, mrect);
                f.render_widget(Block::default().borders(Borders::ALL).title("Help"), mrect);
                let inner = Rect::new(mrect.x + 1, mrect.y + 1, mrect.width.saturating_sub(2), mrect.height.saturating_sub(2));
                let hlines = vec![
                    Spans::from(Span::raw("")),
                    Spans::from(Span::raw(" Left click / Space   reveal cell")),
                    Spans::from(Span::raw(" Right click / F      place or clear flag")),
                    Spans::from(Span::raw(" Arrow keys           move cursor")),
                    Spans::from(Span::raw(" F2                   new game")),
                    Spans::from(Span::raw(" F5                   change difficulty")),
                    Spans::from(Span::raw("")),
                    Spans::from(Span::raw(" Revealing a mine reveals the board.")),
                ];
                f.render_widget(Paragraph::new(Text::from(hlines)).alignment(Alignment::Left), inner);
            } else if ui.showing_loss {
                let mrect = center_rect(36, 6, size);
                modal_rect = Some(mrect);
                f.render_widget(Clear, mrect);
                f.render_widget(Block::default().borders(Borders::ALL).title("Boom"), mrect);
                let inner = Rect::new(mrect.x + 1, mrect.y + 1, mrect.width.saturating_sub(2), mrect.height.saturating_sub(2));
                let llines = vec![
                    Spans::from(Span::raw("")),
                    Spans::from(Span::raw(" You hit a mine. Game over.")),
                    Spans::from(Span::raw(format!(" Time: {} seconds", ui.elapsed_secs()))),
                ];
                f.render_widget(Paragraph::new(Text::from(llines)).alignment(Alignment::Left), inner);
            }
        })?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(KeyEvent { code, kind, .. }) => {
                    if kind == KeyEventKind::Release {
                        continue;
                    }
                    if ui.showing_difficulty {
                        match code {
                            KeyCode::Esc => ui.showing_difficulty = false,
                            KeyCode::Up => {
                                ui.difficulty_selected = ui.difficulty_selected.saturating_sub(1);
                            }
                            KeyCode::Down => {
                                ui.difficulty_selected = (ui.difficulty_selected + 1).min(difficulties.len() - 1);
                            }
                            KeyCode::Char(c @ '1'..='3') => {
                                let d = difficulties[c as usize - '1' as usize];
                                apply_difficulty(&mut session, &mut ui, cfg, d);
                            }
                            KeyCode::Enter | KeyCode::Char(' ') => {
                                let d = difficulties[ui.difficulty_selected];
                                apply_difficulty(&mut session, &mut ui, cfg, d);
                            }
                            _ => {}
                        }
                    } else if ui.showing_help {
                        ui.showing_help = false;
                    } else if ui.showing_loss {
                        // board stays fully revealed behind the dialog
                        ui.showing_loss = false;
                    } else {
                        match code {
                            KeyCode::Esc => break,
                            KeyCode::F(1) => ui.showing_help = true,
                            KeyCode::F(2) => start_new_game(&mut session, &mut ui, cfg.difficulty),
                            KeyCode::F(5) => {
                                ui.difficulty_selected = cfg.difficulty.to_index();
                                ui.showing_difficulty = true;
                            }
                            KeyCode::Left => ui.cursor.1 = ui.cursor.1.saturating_sub(1),
                            KeyCode::Right => ui.cursor.1 = (ui.cursor.1 + 1).min(session.columns() - 1),
                            KeyCode::Up => ui.cursor.0 = ui.cursor.0.saturating_sub(1),
                            KeyCode::Down => ui.cursor.0 = (ui.cursor.0 + 1).min(session.rows() - 1),
                            KeyCode::Char(' ') | KeyCode::Enter => {
                                let (row, col) = ui.cursor;
                                reveal_at(&mut session, &mut ui, row, col)?;
                            }
                            KeyCode::Char('f') | KeyCode::Char('F') => {
                                let (row, col) = ui.cursor;
                                flag_at(&mut session, &mut ui, row, col)?;
                            }
                            _ => {}
                        }
                    }
                }
                Event::Mouse(me) => {
                    if let Some(mrect) = modal_rect {
                        // difficulty rows are clickable; other modals close on click
                        if me.kind == MouseEventKind::Down(MouseButton::Left) {
                            if ui.showing_difficulty {
                                let inside = me.column > mrect.x
                                    && me.column < mrect.x + mrect.width.saturating_sub(1)
                                    && me.row > mrect.y
                                    && me.row < mrect.y + mrect.height.saturating_sub(1);
                                // first list row sits two lines below the top border
                                if inside && me.row >= mrect.y + 2 {
                                    let i = (me.row - mrect.y - 2) as usize;
                                    if i < difficulties.len() {
                                        apply_difficulty(&mut session, &mut ui, cfg, difficulties[i]);
                                    }
                                } else if !inside {
                                    ui.showing_difficulty = false;
                                }
                            } else {
                                ui.showing_help = false;
                                ui.showing_loss = false;
                            }
                        }
                        continue;
                    }
                    let on_menu = menu_rect.map_or(false, |m| {
                        me.row >= m.y && me.row < m.y + m.height
                    });
                    if on_menu {
                        let hit = menu_rect.and_then(|m| menu_item_at(&menu_items[..3], m, me.column, me.row));
                        match me.kind {
                            MouseEventKind::Moved => ui.hover_index = hit,
                            MouseEventKind::Down(MouseButton::Left) => {
                                ui.clicked_index = hit;
                                ui.click_instant = Some(Instant::now());
                            }
                            MouseEventKind::Up(MouseButton::Left) => {
                                if ui.clicked_index.is_some() && ui.clicked_index == hit {
                                    match ui.clicked_index {
                                        Some(0) => ui.showing_help = true,
                                        Some(1) => start_new_game(&mut session, &mut ui, cfg.difficulty),
                                        Some(2) => {
                                            ui.difficulty_selected = cfg.difficulty.to_index();
                                            ui.showing_difficulty = true;
                                        }
                                        _ => {}
                                    }
                                }
                                ui.clicked_index = None;
                            }
                            _ => {}
                        }
                        continue;
                    }
                    ui.hover_index = None;
                    if let Some(brect) = board_rect {
                        match me.kind {
                            MouseEventKind::Moved => {
                                if let Some(cell) = cell_at(brect, me.column, me.row, &session) {
                                    ui.cursor = cell;
                                }
                            }
                            MouseEventKind::Down(MouseButton::Left) => {
                                ui.left_press = cell_at(brect, me.column, me.row, &session);
                            }
                            MouseEventKind::Up(MouseButton::Left) => {
                                if let Some(cell) = cell_at(brect, me.column, me.row, &session) {
                                    if ui.left_press == Some(cell) {
                                        reveal_at(&mut session, &mut ui, cell.0, cell.1)?;
                                    }
                                }
                                ui.left_press = None;
                            }
                            MouseEventKind::Down(MouseButton::Right) => {
                                if let Some(cell) = cell_at(brect, me.column, me.row, &session) {
                                    flag_at(&mut session, &mut ui, cell.0, cell.1)?;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            // release stuck menu press highlight
            if let Some(t0) = ui.click_instant {
                if t0.elapsed() > Duration::from_millis(400) {
                    ui.clicked_index = None;
                    ui.click_instant = None;
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn apply_difficulty(session: &mut GameSession, ui: &mut UiState, cfg: &mut Config, d: Difficulty) {
    start_new_game(session, ui, d);
    if ui.notice.is_none() {
        cfg.difficulty = d;
        save_config(cfg);
    }
    ui.showing_difficulty = false;
}

/// Which menu item (if any) sits under the pointer. Items are laid out as
/// " F1: Help   F2: New   ..." inside the menu block border.
fn menu_item_at(items: &[(&str, &str)], menu: Rect, column: u16, row: u16) -> Option<usize> {
    if row != menu.y + 1 {
        return None;
    }
    let mut x = menu.x + 2; // border + leading pad
    for (i, (key, rest)) in items.iter().enumerate() {
        let w = (key.width() + 2 + rest.width()) as u16;
        if column >= x && column < x + w {
            return Some(i);
        }
        x += w + 3;
    }
    None
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let w = width.min(r.width);
    let h = height.min(r.height);
    let x = r.x + (r.width.saturating_sub(w)) / 2;
    let y = r.y + (r.height.saturating_sub(h)) / 2;
    Rect::new(x, y, w, h)
}
