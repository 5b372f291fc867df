use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type TaskId = u32;

pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub color: ColorTag,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Green,
    Yellow,
    Blue,
    Pink,
    Purple,
    Gray,
}

/// Calendar day used to bucket assigned tasks. Renders as `yyyy-MM-dd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Week,
    Month,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Pool,
    Day(DayKey),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PlannerError {
    #[error("task {0} is not in the pool")]
    TaskNotInPool(TaskId),
    #[error("task {0} cannot be edited")]
    NotEditable(TaskId),
    #[error("invalid drag payload: {0:?}")]
    InvalidDragPayload(String),
    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),
    #[error("invalid day key (use yyyy-MM-dd): {0}")]
    InvalidDayKey(String),
}

/// All widget state: the unassigned pool, the per-day assignments, the edit
/// cursor and the view mode. Every user action is one `&mut self` method.
#[derive(Debug, Clone)]
pub struct Planner {
    pool: Vec<Task>,
    assignments: BTreeMap<DayKey, Vec<Task>>,
    edit_cursor: Option<TaskId>,
    view: ViewMode,
}

impl Task {
    pub fn new(id: TaskId, text: impl Into<String>, color: ColorTag) -> Self {
        Task {
            id,
            text: text.into(),
            color,
        }
    }
}

pub fn seed_tasks() -> Vec<Task> {
    vec![
        Task::new(1, "Полить цветы", ColorTag::Green),
        Task::new(2, "Купить землю", ColorTag::Yellow),
        Task::new(3, "Посадить мускари", ColorTag::Blue),
    ]
}

pub fn parse_drag_payload(raw: &str) -> Result<TaskId, PlannerError> {
    raw.trim()
        .parse::<TaskId>()
        .map_err(|_| PlannerError::InvalidDragPayload(raw.to_string()))
}

impl DayKey {
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), DAY_KEY_FORMAT)
            .map(DayKey)
            .map_err(|_| PlannerError::InvalidDayKey(s.to_string()))
    }
}

impl ViewMode {
    pub fn is_week(&self) -> bool {
        matches!(self, ViewMode::Week)
    }

    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Week => ViewMode::Month,
            ViewMode::Month => ViewMode::Week,
        }
    }
}

impl Default for Planner {
    fn default() -> Self {
        Planner {
            pool: seed_tasks(),
            assignments: BTreeMap::new(),
            edit_cursor: None,
            view: ViewMode::Week,
        }
    }
}

impl Planner {
    pub fn with_tasks(tasks: Vec<Task>) -> Result<Self, PlannerError> {
        let mut pool: Vec<Task> = Vec::with_capacity(tasks.len());
        for task in tasks {
            if pool.iter().any(|t| t.id == task.id) {
                return Err(PlannerError::DuplicateTask(task.id));
            }
            pool.push(task);
        }
        Ok(Planner {
            pool,
            ..Planner::default()
        })
    }

    pub fn pool(&self) -> &[Task] {
        &self.pool
    }

    pub fn assignments(&self) -> &BTreeMap<DayKey, Vec<Task>> {
        &self.assignments
    }

    pub fn day_tasks(&self, day: &DayKey) -> &[Task] {
        self.assignments
            .get(day)
            .map(|tasks| tasks.as_slice())
            .unwrap_or(&[])
    }

    pub fn edit_cursor(&self) -> Option<TaskId> {
        self.edit_cursor
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn task_count(&self) -> usize {
        self.pool.len() + self.assignments.values().map(Vec::len).sum::<usize>()
    }

    pub fn pool_index(&self, id: TaskId) -> Option<usize> {
        self.pool.iter().position(|t| t.id == id)
    }

    pub fn locate(&self, id: TaskId) -> Option<Location> {
        if self.pool_index(id).is_some() {
            return Some(Location::Pool);
        }
        self.assignments
            .iter()
            .find(|(_, tasks)| tasks.iter().any(|t| t.id == id))
            .map(|(day, _)| Location::Day(*day))
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.pool
            .iter()
            .chain(self.assignments.values().flatten())
            .find(|t| t.id == id)
    }

    /// Moves `task` from the pool to the end of `day`'s sequence. Nothing
    /// changes when the id is not in the pool.
    pub fn assign(&mut self, day: DayKey, task: &Task) -> Result<(), PlannerError> {
        let idx = self
            .pool_index(task.id)
            .ok_or(PlannerError::TaskNotInPool(task.id))?;
        let moved = self.pool.remove(idx);
        log::debug!("assigning task {} to {}", moved.id, day);
        self.assignments.entry(day).or_default().push(moved);
        Ok(())
    }

    pub fn drop_payload(&mut self, day: DayKey, payload: &str) -> Result<TaskId, PlannerError> {
        let id = parse_drag_payload(payload)?;
        let task = self
            .pool
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(PlannerError::TaskNotInPool(id))?;
        self.assign(day, &task)?;
        Ok(id)
    }

    pub fn begin_edit(&mut self, id: TaskId) -> Result<(), PlannerError> {
        if self.pool_index(id).is_none() {
            return Err(PlannerError::NotEditable(id));
        }
        self.edit_cursor = Some(id);
        Ok(())
    }

    /// Replaces the text of pool task `id`. The edit cursor is cleared even
    /// when no pool task matched. Returns whether a task was updated.
    pub fn commit_edit(&mut self, id: TaskId, new_text: impl Into<String>) -> bool {
        self.edit_cursor = None;
        match self.pool.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.text = new_text.into();
                true
            }
            None => false,
        }
    }

    pub fn toggle_view(&mut self) -> ViewMode {
        self.view = self.view.toggled();
        self.view
    }
}
