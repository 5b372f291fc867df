use crate::model::{ColorTag, DayKey, Planner, Task, TaskId, ViewMode};
use crate::week::{current_week, month_placeholder_cells, short_label, Locale, DAYS_IN_WEEK};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const CARD_HEIGHT: u16 = 3;
const MONTH_ROWS: u32 = 5;
const DOUBLE_CLICK: Duration = Duration::from_millis(400);
const ACCENT: Color = Color::Rgb(0x22, 0xc5, 0x5e);

pub fn run(planner: Planner, locale: Locale, date_locale: Locale) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(planner, locale, date_locale, current_week());
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    planner: Planner,
    locale: Locale,
    date_locale: Locale,
    days: [NaiveDate; DAYS_IN_WEEK],
    focus: Focus,
    selected_task: usize,
    pool_offset: usize,
    selected_day: usize,
    mode: Mode,
    last_click: Option<Click>,
    hits: Vec<Hit>,
    status: String,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Focus {
    Pool,
    Calendar,
}

enum Mode {
    Normal,
    Dragging(DragState),
    Editing { task_id: TaskId, field: FieldValue },
}

/// A task card in flight. The payload is the task id as plain text.
struct DragState {
    payload: String,
    source: DragSource,
    hover: Option<usize>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum DragSource {
    Mouse,
    Keyboard,
}

#[derive(Copy, Clone)]
struct Click {
    task_id: TaskId,
    at: Instant,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum HitTarget {
    PoolTask(TaskId),
    Day(usize),
    EditField,
    ToggleButton,
}

#[derive(Copy, Clone, Debug)]
struct Hit {
    area: Rect,
    target: HitTarget,
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        self.cursor = prev_char(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        self.cursor = next_char(self.cursor, &self.value);
    }

    fn home(&mut self) {
        self.cursor = 0;
    }

    fn end(&mut self) {
        self.cursor = self.value.len();
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn delete(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        let next = next_char(self.cursor, &self.value);
        self.value.drain(self.cursor..next);
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl Focus {
    fn other(self) -> Self {
        match self {
            Focus::Pool => Focus::Calendar,
            Focus::Calendar => Focus::Pool,
        }
    }
}

impl App {
    fn new(
        planner: Planner,
        locale: Locale,
        date_locale: Locale,
        days: [NaiveDate; DAYS_IN_WEEK],
    ) -> Self {
        let today = Local::now().date_naive();
        let selected_day = days.iter().position(|d| *d == today).unwrap_or(0);
        App {
            planner,
            locale,
            date_locale,
            days,
            focus: Focus::Pool,
            selected_task: 0,
            pool_offset: 0,
            selected_day,
            mode: Mode::Normal,
            last_click: None,
            hits: Vec::new(),
            status: String::new(),
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse, Instant::now()),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::Dragging(_) => self.handle_drag_key(key),
            Mode::Editing { .. } => self.handle_edit_key(key),
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('t') => self.toggle_view(),
            KeyCode::Tab | KeyCode::BackTab => self.focus = self.focus.other(),
            KeyCode::Up | KeyCode::Char('k') => {
                if self.focus == Focus::Pool {
                    self.selected_task = self.selected_task.saturating_sub(1);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.focus == Focus::Pool && self.selected_task + 1 < self.planner.pool().len()
                {
                    self.selected_task += 1;
                }
            }
            KeyCode::Left | KeyCode::Char('h') => match self.focus {
                Focus::Calendar if self.selected_day == 0 => self.focus = Focus::Pool,
                Focus::Calendar => self.shift_day(-1),
                Focus::Pool => {}
            },
            KeyCode::Right | KeyCode::Char('l') => match self.focus {
                Focus::Calendar => self.shift_day(1),
                Focus::Pool => self.focus = Focus::Calendar,
            },
            KeyCode::Char(' ') => self.pick_up_selected(),
            KeyCode::Enter | KeyCode::Char('e') => {
                if self.focus == Focus::Pool {
                    if let Some(id) = self.selected_pool_id() {
                        self.begin_edit(id);
                    }
                }
            }
            _ => {}
        }
        false
    }

    fn handle_drag_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.shift_day(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_day(1),
            KeyCode::Char(' ') | KeyCode::Enter => self.drop_dragged(self.selected_day),
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = self.locale.strings().drag_canceled.into();
            }
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Enter | KeyCode::Esc | KeyCode::Tab | KeyCode::BackTab
        ) {
            self.blur();
            return;
        }
        let Mode::Editing { field, .. } = &mut self.mode else {
            return;
        };
        match key.code {
            KeyCode::Left => field.move_left(),
            KeyCode::Right => field.move_right(),
            KeyCode::Home => field.home(),
            KeyCode::End => field.end(),
            KeyCode::Backspace => field.backspace(),
            KeyCode::Delete => field.delete(),
            KeyCode::Char(c) => {
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                {
                    field.insert_char(c);
                }
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let target = self.hit_at(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.mouse_down(target, now),
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Mode::Dragging(drag) = &mut self.mode {
                    drag.hover = match target {
                        Some(HitTarget::Day(idx)) => Some(idx),
                        _ => None,
                    };
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.mouse_up(target),
            _ => {}
        }
    }

    fn mouse_down(&mut self, target: Option<HitTarget>, now: Instant) {
        if matches!(self.mode, Mode::Editing { .. }) {
            if target == Some(HitTarget::EditField) {
                return;
            }
            self.blur();
        }
        if matches!(self.mode, Mode::Dragging(_)) {
            match target {
                Some(HitTarget::Day(idx)) => self.drop_dragged(idx),
                _ => self.mode = Mode::Normal,
            }
            return;
        }
        match target {
            Some(HitTarget::ToggleButton) => self.toggle_view(),
            Some(HitTarget::PoolTask(id)) => {
                self.focus = Focus::Pool;
                if let Some(idx) = self.planner.pool_index(id) {
                    self.selected_task = idx;
                }
                let double = self
                    .last_click
                    .map(|c| c.task_id == id && now.duration_since(c.at) <= DOUBLE_CLICK)
                    .unwrap_or(false);
                if double {
                    self.last_click = None;
                    self.begin_edit(id);
                } else {
                    self.last_click = Some(Click { task_id: id, at: now });
                    self.start_drag(id, DragSource::Mouse);
                }
            }
            Some(HitTarget::Day(idx)) => {
                self.focus = Focus::Calendar;
                self.selected_day = idx;
            }
            Some(HitTarget::EditField) | None => {}
        }
    }

    fn mouse_up(&mut self, target: Option<HitTarget>) {
        let from_mouse =
            matches!(&self.mode, Mode::Dragging(drag) if drag.source == DragSource::Mouse);
        if !from_mouse {
            return;
        }
        match target {
            Some(HitTarget::Day(idx)) => self.drop_dragged(idx),
            // released outside the board: plain click
            _ => self.mode = Mode::Normal,
        }
    }

    fn hit_at(&self, column: u16, row: u16) -> Option<HitTarget> {
        self.hits
            .iter()
            .rev()
            .find(|hit| {
                let a = hit.area;
                column >= a.x && column < a.x + a.width && row >= a.y && row < a.y + a.height
            })
            .map(|hit| hit.target)
    }

    fn toggle_view(&mut self) {
        let view = self.planner.toggle_view();
        self.status = format!(
            "{} ({})",
            self.locale.strings().calendar,
            view_name(view, self.locale)
        );
    }

    fn shift_day(&mut self, delta: isize) {
        let max = DAYS_IN_WEEK as isize - 1;
        self.selected_day = (self.selected_day as isize + delta).clamp(0, max) as usize;
    }

    fn selected_pool_id(&self) -> Option<TaskId> {
        self.planner.pool().get(self.selected_task).map(|t| t.id)
    }

    fn pick_up_selected(&mut self) {
        if self.focus != Focus::Pool {
            return;
        }
        match self.selected_pool_id() {
            Some(id) => {
                self.start_drag(id, DragSource::Keyboard);
                self.focus = Focus::Calendar;
            }
            None => self.status = self.locale.strings().nothing_to_pick_up.into(),
        }
    }

    fn start_drag(&mut self, id: TaskId, source: DragSource) {
        self.mode = Mode::Dragging(DragState {
            payload: id.to_string(),
            source,
            hover: None,
        });
        if source == DragSource::Keyboard {
            self.status = self.task_status(self.locale.strings().dragging, id);
        }
    }

    fn drop_dragged(&mut self, day_idx: usize) {
        let drag = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Dragging(drag) => drag,
            other => {
                self.mode = other;
                return;
            }
        };
        if !self.planner.view().is_week() {
            log::debug!("drop ignored outside the week view");
            return;
        }
        let Some(date) = self.days.get(day_idx).copied() else {
            return;
        };
        let key = DayKey::from(date);
        match self.planner.drop_payload(key, &drag.payload) {
            Ok(id) => {
                log::info!("task {} dropped, now at {:?}", id, self.planner.locate(id));
                self.selected_day = day_idx;
                let strings = self.locale.strings();
                self.status = format!(
                    "{} {} → {}",
                    strings.task,
                    id,
                    short_label(date, self.date_locale)
                );
            }
            Err(err) => log::warn!("drop on {} ignored: {}", key, err),
        }
        self.clamp_selection();
    }

    fn begin_edit(&mut self, id: TaskId) {
        if let Err(err) = self.planner.begin_edit(id) {
            log::debug!("edit ignored: {}", err);
            return;
        }
        let text = self
            .planner
            .task(id)
            .map(|t| t.text.clone())
            .unwrap_or_default();
        self.mode = Mode::Editing {
            task_id: id,
            field: FieldValue::new(&text),
        };
        self.focus = Focus::Pool;
        if let Some(idx) = self.planner.pool_index(id) {
            self.selected_task = idx;
        }
        self.status = self.task_status(self.locale.strings().editing, id);
    }

    /// The edit field lost focus: commit whatever was typed.
    fn blur(&mut self) {
        let (task_id, field) = match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Editing { task_id, field } => (task_id, field),
            other => {
                self.mode = other;
                return;
            }
        };
        if self.planner.commit_edit(task_id, field.value) {
            self.status = self.task_status(self.locale.strings().renamed, task_id);
        } else {
            log::warn!("edit for task {} matched no pool task", task_id);
        }
    }

    fn task_status(&self, action: &str, id: TaskId) -> String {
        format!("{}: {} {}", action, self.locale.strings().task, id)
    }

    fn clamp_selection(&mut self) {
        let len = self.planner.pool().len();
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    fn dragged_id(&self) -> Option<TaskId> {
        match &self.mode {
            Mode::Dragging(drag) => drag.payload.parse().ok(),
            _ => None,
        }
    }

    fn drop_target(&self) -> Option<usize> {
        match &self.mode {
            Mode::Dragging(drag) => match drag.source {
                DragSource::Keyboard => Some(self.selected_day),
                DragSource::Mouse => drag.hover,
            },
            _ => None,
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(f.size());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(layout[1]);

        let viewport = (body[0].height.saturating_sub(2) / CARD_HEIGHT) as usize;
        self.pool_offset = adjust_offset(
            self.selected_task,
            self.pool_offset,
            viewport,
            1,
            self.planner.pool().len(),
        );

        let mut hits = Vec::new();
        self.draw_header(f, layout[0]);
        self.draw_pool(f, body[0], &mut hits);
        self.draw_calendar(f, body[1], &mut hits);
        self.draw_footer(f, layout[2]);
        self.hits = hits;
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let first = self.days[0];
        let last = self.days[DAYS_IN_WEEK - 1];
        let scheduled: usize = self.planner.assignments().values().map(Vec::len).sum();
        let strings = self.locale.strings();
        let title = Line::from(vec![
            Span::styled(
                "weekplan ",
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} … {}", DayKey::from(first), DayKey::from(last)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} {}", strings.scheduled, scheduled),
                Style::default().fg(Color::LightYellow),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("{} {}", strings.view, view_name(self.planner.view(), self.locale)),
                Style::default().fg(Color::Magenta),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_pool(&self, f: &mut ratatui::Frame<'_>, area: Rect, hits: &mut Vec<Hit>) {
        let focused = self.focus == Focus::Pool;
        let pool = self.planner.pool();
        let block = Block::default()
            .title(Span::styled(
                format!("{} ({})", self.locale.strings().tasks, pool.len()),
                Style::default()
                    .fg(if focused { ACCENT } else { Color::Gray })
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused {
                ACCENT
            } else {
                Color::DarkGray
            }));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let lifted = self.dragged_id();
        let visible = pool.len().saturating_sub(self.pool_offset);
        let rects = card_rects(inner, visible);
        for ((idx, task), rect) in pool.iter().enumerate().skip(self.pool_offset).zip(rects) {
            match (&self.mode, self.planner.edit_cursor()) {
                (Mode::Editing { field, .. }, Some(id)) if id == task.id => {
                    f.render_widget(edit_card(field), rect);
                    hits.push(Hit {
                        area: rect,
                        target: HitTarget::EditField,
                    });
                }
                _ => {
                    let selected = focused && idx == self.selected_task;
                    f.render_widget(
                        task_card(task, rect.width, selected, lifted == Some(task.id)),
                        rect,
                    );
                    hits.push(Hit {
                        area: rect,
                        target: HitTarget::PoolTask(task.id),
                    });
                }
            }
        }
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect, hits: &mut Vec<Hit>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(3)])
            .split(area);

        let heading = Paragraph::new(Line::from(Span::styled(
            format!(
                "{} ({})",
                self.locale.strings().calendar,
                view_name(self.planner.view(), self.locale)
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        f.render_widget(heading, rows[0]);

        let caption = format!("[ {} ]", self.locale.strings().toggle);
        let width = (caption.chars().count() as u16).min(rows[0].width);
        let button = Rect::new(rows[0].right().saturating_sub(width), rows[0].y, width, 1);
        f.render_widget(
            Paragraph::new(Span::styled(
                caption,
                Style::default().fg(Color::Black).bg(Color::Gray),
            )),
            button,
        );
        hits.push(Hit {
            area: button,
            target: HitTarget::ToggleButton,
        });

        match self.planner.view() {
            ViewMode::Week => self.draw_week(f, rows[1], hits),
            ViewMode::Month => draw_month(f, rows[1]),
        }
    }

    fn draw_week(&self, f: &mut ratatui::Frame<'_>, area: Rect, hits: &mut Vec<Hit>) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, DAYS_IN_WEEK as u32); DAYS_IN_WEEK])
            .split(area);
        let target = self.drop_target();

        for (idx, date) in self.days.iter().enumerate() {
            let key = DayKey::from(*date);
            let tasks = self.planner.day_tasks(&key);
            let accent = if target == Some(idx) {
                Color::LightYellow
            } else if self.focus == Focus::Calendar && idx == self.selected_day {
                ACCENT
            } else {
                Color::DarkGray
            };
            let block = Block::default()
                .title(Span::styled(
                    short_label(*date, self.date_locale),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent))
                .style(Style::default().bg(Color::Rgb(16, 18, 24)));
            let inner = block.inner(columns[idx]);
            f.render_widget(block, columns[idx]);
            let fits = (inner.height / CARD_HEIGHT) as usize;
            let shown = if tasks.len() > fits {
                (inner.height.saturating_sub(1) / CARD_HEIGHT) as usize
            } else {
                tasks.len()
            };
            let rects = card_rects(inner, shown);
            let below = rects.last().map_or(inner.y, |r| r.bottom());
            for (task, rect) in tasks.iter().zip(rects) {
                f.render_widget(task_card(task, rect.width, false, false), rect);
            }
            if shown < tasks.len() && below < inner.bottom() {
                let more = format!(
                    "+{} {}",
                    tasks.len() - shown,
                    self.locale.strings().more
                );
                f.render_widget(
                    Paragraph::new(Span::styled(more, Style::default().fg(Color::Gray))),
                    Rect::new(inner.x, below, inner.width, 1),
                );
            }
            hits.push(Hit {
                area: columns[idx],
                target: HitTarget::Day(idx),
            });
        }
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(1)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let status = Paragraph::new(self.status.clone()).wrap(Wrap { trim: true });
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let strings = self.locale.strings();
        let keys = Style::default().fg(Color::LightCyan);
        let hint = |key: &'static str, style: Style, label: &str| {
            [Span::styled(key, style), Span::raw(format!(" {}  ", label))]
        };
        let spans: Vec<Span<'static>> = match self.mode {
            Mode::Normal => [
                hint("↑↓", keys, strings.help_select),
                hint("Space", keys, strings.help_pick_up),
                hint(
                    "Enter/e",
                    Style::default().fg(Color::LightYellow),
                    strings.help_edit,
                ),
                hint("Tab", keys, strings.help_focus),
                hint(
                    "t",
                    Style::default().fg(Color::LightMagenta),
                    strings.help_toggle,
                ),
                hint("q", Style::default().fg(Color::LightRed), strings.help_quit),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Mode::Dragging(_) => [
                hint("←→", keys, strings.help_choose_day),
                hint(
                    "Space/Enter",
                    Style::default().fg(Color::LightGreen),
                    strings.help_drop,
                ),
                hint("Esc", Style::default().fg(Color::LightRed), strings.help_cancel),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Mode::Editing { .. } => {
                let mut spans = vec![Span::raw(format!("{}  ", strings.help_type))];
                spans.extend(hint(
                    "Enter/Esc/Tab",
                    Style::default().fg(Color::LightGreen),
                    strings.help_save,
                ));
                spans
            }
        };
        Line::from(spans)
    }
}

fn draw_month(f: &mut ratatui::Frame<'_>, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, MONTH_ROWS); MONTH_ROWS as usize])
        .split(area);
    let mut cells = month_placeholder_cells();
    for row in rows.iter() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, DAYS_IN_WEEK as u32); DAYS_IN_WEEK])
            .split(*row);
        for column in columns.iter() {
            let Some(number) = cells.next() else {
                return;
            };
            let cell = Paragraph::new(number.to_string())
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                );
            f.render_widget(cell, *column);
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn view_name(view: ViewMode, locale: Locale) -> &'static str {
    match view {
        ViewMode::Week => locale.strings().week,
        ViewMode::Month => locale.strings().month,
    }
}

/// Stacks card-sized rows from the top of `area`, as many as fit.
fn card_rects(area: Rect, count: usize) -> Vec<Rect> {
    let fits = (area.height / CARD_HEIGHT) as usize;
    (0..count.min(fits))
        .map(|i| Rect::new(area.x, area.y + i as u16 * CARD_HEIGHT, area.width, CARD_HEIGHT))
        .collect()
}

/// First visible row so that `selected` stays `scrolloff` rows from either edge.
fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn card_color(color: ColorTag) -> Color {
    match color {
        ColorTag::Green => Color::Rgb(134, 239, 172),
        ColorTag::Yellow => Color::Rgb(253, 224, 71),
        ColorTag::Blue => Color::Rgb(147, 197, 253),
        ColorTag::Pink => Color::Rgb(249, 168, 212),
        ColorTag::Purple => Color::Rgb(216, 180, 254),
        ColorTag::Gray => Color::Rgb(209, 213, 219),
    }
}

fn task_card(task: &Task, width: u16, selected: bool, lifted: bool) -> Paragraph<'static> {
    let text = truncate_text(&task.text, width.saturating_sub(2) as usize);
    let mut style = Style::default().bg(card_color(task.color)).fg(Color::Black);
    if lifted {
        style = style.add_modifier(Modifier::DIM | Modifier::ITALIC);
    }
    let border = if selected {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Paragraph::new(Line::from(Span::styled(
        text,
        style.add_modifier(Modifier::BOLD),
    )))
    .style(style)
    .block(Block::default().borders(Borders::ALL).border_style(border))
}

fn edit_card(field: &FieldValue) -> Paragraph<'static> {
    Paragraph::new(field.with_caret())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
}

fn prev_char(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use crate::week::week_of;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    const TERM_W: u16 = 120;
    const TERM_H: u16 = 30;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn app() -> App {
        let mut app = App::new(Planner::default(), Locale::Ru, Locale::En, week_of(monday()));
        app.selected_day = 0;
        app
    }

    fn app_with_tasks(count: u32) -> App {
        let tasks = (1..=count)
            .map(|id| Task::new(id, format!("Task {}", id), ColorTag::Blue))
            .collect();
        let planner = Planner::with_tasks(tasks).unwrap();
        let mut app = App::new(planner, Locale::Ru, Locale::En, week_of(monday()));
        app.selected_day = 0;
        app
    }

    /// Draws into an in-memory buffer and returns the plain text.
    fn render(app: &mut App) -> String {
        let backend = TestBackend::new(TERM_W, TERM_H);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content
            .chunks(buf.area.width as usize)
            .map(|row| {
                let s: String = row.iter().map(|cell| cell.symbol()).collect();
                s.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn center_of(app: &App, target: HitTarget) -> (u16, u16) {
        let hit = app
            .hits
            .iter()
            .find(|h| h.target == target)
            .unwrap_or_else(|| panic!("no hit region for {:?}", target));
        (
            hit.area.x + hit.area.width / 2,
            hit.area.y + hit.area.height / 2,
        )
    }

    fn mouse(app: &mut App, kind: MouseEventKind, at: (u16, u16), now: Instant) {
        app.handle_mouse(
            MouseEvent {
                kind,
                column: at.0,
                row: at.1,
                modifiers: KeyModifiers::NONE,
            },
            now,
        );
    }

    fn monday_key() -> DayKey {
        DayKey::from(monday())
    }

    #[test]
    fn renders_pool_and_week() {
        let mut app = app();
        let screen = render(&mut app);
        assert!(screen.contains("Задачи (3)"));
        assert!(screen.contains("Полить цветы"));
        assert!(screen.contains("Календарь (Неделя)"));
        assert!(screen.contains("[ Переключить ]"));
        assert!(screen.contains("Mon 19.10"));
        assert!(screen.contains("Sun 25.10"));
        assert!(screen.contains("запланировано 0"));
        assert!(screen.contains("вид Неделя"));
        assert!(!screen.contains("scheduled"));
    }

    #[test]
    fn pool_scrolls_to_keep_selection_visible() {
        let mut app = app_with_tasks(10);
        let screen = render(&mut app);
        assert!(screen.contains("Task 1"));
        assert!(!screen.contains("Task 10"));

        for _ in 0..9 {
            press(&mut app, KeyCode::Down);
        }
        let screen = render(&mut app);
        assert!(screen.contains("Task 10"));
        assert!(app.hits.iter().any(|h| h.target == HitTarget::PoolTask(10)));
        assert!(!app.hits.iter().any(|h| h.target == HitTarget::PoolTask(1)));

        press(&mut app, KeyCode::Enter);
        let screen = render(&mut app);
        assert_eq!(app.planner.edit_cursor(), Some(10));
        assert!(app.hits.iter().any(|h| h.target == HitTarget::EditField));
        assert!(screen.contains("Task 10▌"));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.planner.edit_cursor(), None);
        for _ in 0..9 {
            press(&mut app, KeyCode::Up);
        }
        render(&mut app);
        assert!(app.hits.iter().any(|h| h.target == HitTarget::PoolTask(1)));
    }

    #[test]
    fn overflowing_day_shows_hidden_count() {
        let mut app = app_with_tasks(10);
        for id in 1..=10 {
            let task = app.planner.task(id).cloned().unwrap();
            app.planner.assign(monday_key(), &task).unwrap();
        }
        let screen = render(&mut app);
        assert!(screen.contains("+4 ещё"));
        assert!(screen.contains("Task 6"));
        assert!(!screen.contains("Task 7"));
    }

    #[test]
    fn status_messages_follow_ui_locale() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.status, "Перетаскивание: Задача 1");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status, "Задача 1 → Mon 19.10");

        let mut app = App::new(Planner::default(), Locale::En, Locale::En, week_of(monday()));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.status, "Drag canceled");
        let screen = render(&mut app);
        assert!(screen.contains("scheduled 0"));
        assert!(screen.contains("Tasks (3)"));
    }

    #[test]
    fn keyboard_drag_and_edit_end_to_end() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char(' '));
        assert!(matches!(app.mode, Mode::Dragging(_)));
        assert_eq!(app.focus, Focus::Calendar);
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.planner.pool().len(), 2);
        assert_eq!(
            app.planner.day_tasks(&monday_key()),
            &[Task::new(2, "Купить землю", ColorTag::Yellow)]
        );

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.planner.edit_cursor(), Some(1));
        for _ in 0..20 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Пересадить цветы");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.planner.pool()[0].text, "Пересадить цветы");
        assert_eq!(app.planner.edit_cursor(), None);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn mouse_drag_and_double_click_end_to_end() {
        let mut app = app();
        let t0 = Instant::now();
        render(&mut app);

        let card = center_of(&app, HitTarget::PoolTask(2));
        let day = center_of(&app, HitTarget::Day(0));
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), card, t0);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), day, t0);
        assert_eq!(app.drop_target(), Some(0));
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), day, t0);

        assert_eq!(app.planner.locate(2), Some(Location::Day(monday_key())));
        assert_eq!(app.planner.pool().len(), 2);

        let screen = render(&mut app);
        assert!(screen.contains("Задачи (2)"));
        assert!(screen.contains("Купить"));

        let card = center_of(&app, HitTarget::PoolTask(1));
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), card, t0);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), card, t0);
        let t1 = t0 + Duration::from_millis(150);
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), card, t1);
        assert_eq!(app.planner.edit_cursor(), Some(1));

        press(&mut app, KeyCode::Home);
        for _ in 0.."Полить".chars().count() {
            press(&mut app, KeyCode::Delete);
        }
        type_text(&mut app, "Пересадить");
        render(&mut app);
        let elsewhere = center_of(&app, HitTarget::Day(3));
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), elsewhere, t1);

        assert_eq!(app.planner.edit_cursor(), None);
        assert_eq!(app.planner.pool()[0].text, "Пересадить цветы");
    }

    #[test]
    fn slow_second_click_does_not_edit() {
        let mut app = app();
        let t0 = Instant::now();
        render(&mut app);
        let card = center_of(&app, HitTarget::PoolTask(3));
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), card, t0);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), card, t0);
        let later = t0 + Duration::from_secs(1);
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), card, later);

        assert_eq!(app.planner.edit_cursor(), None);
        assert!(matches!(app.mode, Mode::Dragging(_)));
    }

    #[test]
    fn releasing_outside_a_day_cancels_drag() {
        let mut app = app();
        let now = Instant::now();
        render(&mut app);
        let card = center_of(&app, HitTarget::PoolTask(1));
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), card, now);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), (0, 0), now);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.planner.pool().len(), 3);
    }

    #[test]
    fn malformed_payload_is_ignored() {
        let mut app = app();
        app.mode = Mode::Dragging(DragState {
            payload: "not-a-number".into(),
            source: DragSource::Keyboard,
            hover: None,
        });
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.planner.pool().len(), 3);
        assert!(app.planner.assignments().is_empty());
    }

    #[test]
    fn month_view_shows_placeholder_grid_without_drop_targets() {
        let mut app = app();
        app.planner.drop_payload(monday_key(), "3").unwrap();
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.planner.view(), ViewMode::Month);

        let screen = render(&mut app);
        assert!(screen.contains("Календарь (Месяц)"));
        assert!(screen.contains("35"));
        assert!(!screen.contains("Посадить мускари"));
        assert!(!app
            .hits
            .iter()
            .any(|h| matches!(h.target, HitTarget::Day(_))));

        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.planner.pool().len(), 2);
        assert_eq!(app.planner.day_tasks(&monday_key()).len(), 1);
    }

    #[test]
    fn toggle_button_click_flips_view_twice() {
        let mut app = app();
        let now = Instant::now();
        render(&mut app);
        let button = center_of(&app, HitTarget::ToggleButton);
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), button, now);
        assert_eq!(app.planner.view(), ViewMode::Month);
        render(&mut app);
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), button, now);
        assert_eq!(app.planner.view(), ViewMode::Week);
    }

    #[test]
    fn toggle_is_ignored_while_dragging() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.planner.view(), ViewMode::Week);
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn edit_card_renders_in_place_of_the_task() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        let screen = render(&mut app);
        assert!(screen.contains("Полить цветы▌"));
        assert!(app.hits.iter().any(|h| h.target == HitTarget::EditField));
        assert!(!press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.planner.pool()[0].text, "Полить цветыq");
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn truncates_long_text_with_ellipsis() {
        assert_eq!(truncate_text("Посадить мускари", 6), "Посад…");
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("x", 0), "");
    }
}
