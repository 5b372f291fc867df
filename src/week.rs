use crate::model::DayKey;
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub const DAYS_IN_WEEK: usize = 7;
pub const MONTH_PLACEHOLDER_CELLS: usize = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

/// Monday-first week containing `today`.
pub fn week_of(today: NaiveDate) -> [NaiveDate; DAYS_IN_WEEK] {
    let offset = today.weekday().num_days_from_monday() as i64;
    let monday = today - ChronoDuration::days(offset);
    let mut days = [monday; DAYS_IN_WEEK];
    for (i, day) in days.iter_mut().enumerate() {
        *day = monday + ChronoDuration::days(i as i64);
    }
    days
}

pub fn current_week() -> [NaiveDate; DAYS_IN_WEEK] {
    week_of(Local::now().date_naive())
}

pub fn week_keys(days: &[NaiveDate]) -> Vec<DayKey> {
    days.iter().copied().map(DayKey::from).collect()
}

/// `EEE dd.MM` label, e.g. `Mon 19.10` or `Пн 19.10`.
pub fn short_label(date: NaiveDate, locale: Locale) -> String {
    format!("{} {}", weekday_abbrev(date.weekday(), locale), date.format("%d.%m"))
}

pub fn weekday_abbrev(day: Weekday, locale: Locale) -> &'static str {
    match locale {
        Locale::En => match day {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        },
        Locale::Ru => match day {
            Weekday::Mon => "Пн",
            Weekday::Tue => "Вт",
            Weekday::Wed => "Ср",
            Weekday::Thu => "Чт",
            Weekday::Fri => "Пт",
            Weekday::Sat => "Сб",
            Weekday::Sun => "Вс",
        },
    }
}

/// Numbers shown by the month grid. They do not map to real dates.
pub fn month_placeholder_cells() -> impl Iterator<Item = usize> {
    1..=MONTH_PLACEHOLDER_CELLS
}

/// Fixed UI text for one locale.
#[derive(Debug)]
pub struct Strings {
    pub tasks: &'static str,
    pub task: &'static str,
    pub calendar: &'static str,
    pub week: &'static str,
    pub month: &'static str,
    pub toggle: &'static str,
    pub view: &'static str,
    pub scheduled: &'static str,
    pub more: &'static str,
    pub dragging: &'static str,
    pub drag_canceled: &'static str,
    pub nothing_to_pick_up: &'static str,
    pub editing: &'static str,
    pub renamed: &'static str,
    pub help_select: &'static str,
    pub help_pick_up: &'static str,
    pub help_edit: &'static str,
    pub help_focus: &'static str,
    pub help_toggle: &'static str,
    pub help_quit: &'static str,
    pub help_choose_day: &'static str,
    pub help_drop: &'static str,
    pub help_cancel: &'static str,
    pub help_type: &'static str,
    pub help_save: &'static str,
}

const RU: Strings = Strings {
    tasks: "Задачи",
    task: "Задача",
    calendar: "Календарь",
    week: "Неделя",
    month: "Месяц",
    toggle: "Переключить",
    view: "вид",
    scheduled: "запланировано",
    more: "ещё",
    dragging: "Перетаскивание",
    drag_canceled: "Перетаскивание отменено",
    nothing_to_pick_up: "Нет задачи для перетаскивания",
    editing: "Редактирование",
    renamed: "Переименовано",
    help_select: "выбор",
    help_pick_up: "взять",
    help_edit: "изменить",
    help_focus: "фокус",
    help_toggle: "вид",
    help_quit: "выход",
    help_choose_day: "выбрать день",
    help_drop: "положить",
    help_cancel: "отмена",
    help_type: "введите новый текст",
    help_save: "сохранить",
};

const EN: Strings = Strings {
    tasks: "Tasks",
    task: "Task",
    calendar: "Calendar",
    week: "Week",
    month: "Month",
    toggle: "Toggle",
    view: "view",
    scheduled: "scheduled",
    more: "more",
    dragging: "Dragging",
    drag_canceled: "Drag canceled",
    nothing_to_pick_up: "No task to pick up",
    editing: "Editing",
    renamed: "Renamed",
    help_select: "select",
    help_pick_up: "pick up",
    help_edit: "edit",
    help_focus: "focus",
    help_toggle: "toggle",
    help_quit: "quit",
    help_choose_day: "choose day",
    help_drop: "drop",
    help_cancel: "cancel",
    help_type: "type to rename",
    help_save: "save",
};

impl Locale {
    pub fn strings(&self) -> &'static Strings {
        match self {
            Locale::Ru => &RU,
            Locale::En => &EN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_monday_and_is_consecutive() {
        let mut day = date(2023, 12, 20);
        // crosses a year boundary and the 2024 leap day
        while day <= date(2024, 3, 10) {
            let week = week_of(day);
            assert_eq!(week.len(), 7);
            assert_eq!(week[0].weekday(), Weekday::Mon);
            for pair in week.windows(2) {
                assert_eq!(pair[1] - pair[0], ChronoDuration::days(1));
            }
            assert!(week.contains(&day));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn sunday_belongs_to_the_preceding_monday() {
        let week = week_of(date(2026, 10, 25));
        assert_eq!(week[0], date(2026, 10, 19));
        assert_eq!(week[6], date(2026, 10, 25));
    }

    #[test]
    fn keys_use_iso_day_format() {
        let keys = week_keys(&week_of(date(2026, 12, 30)));
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "2026-12-28",
                "2026-12-29",
                "2026-12-30",
                "2026-12-31",
                "2027-01-01",
                "2027-01-02",
                "2027-01-03",
            ]
        );
    }

    #[test]
    fn labels_follow_locale() {
        assert_eq!(short_label(date(2026, 10, 19), Locale::Ru), "Пн 19.10");
        assert_eq!(short_label(date(2026, 10, 25), Locale::En), "Sun 25.10");
    }

    #[test]
    fn each_locale_has_its_own_ui_text() {
        assert_eq!(Locale::Ru.strings().tasks, "Задачи");
        assert_eq!(Locale::En.strings().tasks, "Tasks");
        assert_eq!(Locale::Ru.strings().more, "ещё");
        assert_eq!(Locale::default(), Locale::Ru);
    }

    #[test]
    fn month_grid_has_35_cells() {
        let cells: Vec<usize> = month_placeholder_cells().collect();
        assert_eq!(cells.len(), 35);
        assert_eq!(cells.first(), Some(&1));
        assert_eq!(cells.last(), Some(&35));
    }
}
