use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    ExportData, ImportSummary, NewTask, NewWeightEntry, Task, WeightEntry, WeightUnit, to_kg,
    validate_task_date, validate_task_title, validate_weight_date, validate_weight_value,
};
use crate::view::{TaskBoard, WeightLog};

const WEIGHT_UNIT_SETTING: &str = "weight_unit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyEvent {
    TaskAdded,
    TaskCompleted,
    WeightAdded,
}

/// Fire-and-forget signal after a successful add or completion.
///
/// The CLI rings the terminal bell. Implementations must not fail the
/// operation that triggered them.
pub trait Notifier {
    fn notify(&self, event: NotifyEvent);
}

pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _event: NotifyEvent) {}
}

pub struct TaskmanService {
    db: Database,
    notifier: Box<dyn Notifier>,
}

impl TaskmanService {
    pub fn new(db_path: &Path, notifier: Box<dyn Notifier>) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db, notifier })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self {
            db,
            notifier: Box::new(SilentNotifier),
        })
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // --- Tasks ---

    pub fn load_tasks(&self, date: NaiveDate) -> Result<TaskBoard> {
        TaskBoard::load(&self.db, date)
    }

    pub fn list_tasks(&self, date: NaiveDate) -> Result<Vec<Task>> {
        self.db.get_tasks_for_date(date)
    }

    /// Add a task and move `board` to the task's day if it shows another one.
    pub fn add_task(
        &mut self,
        board: &mut TaskBoard,
        title: &str,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Task> {
        let title = validate_task_title(title)?;
        validate_task_date(date, today)?;

        if board.date() != date {
            log::debug!(
                "switching displayed day from {} to {date}",
                board.date()
            );
        }
        let task = self.db.insert_task(&NewTask { title, date })?;
        log::info!("added task {} on {}", task.id, task.date);
        self.notifier.notify(NotifyEvent::TaskAdded);
        board.show_date(&self.db, date)?;
        Ok(task)
    }

    /// Complete (delete) task `id` on `date`. There is no undo.
    pub fn complete_task(&self, board: &mut TaskBoard, id: i64, date: NaiveDate) -> Result<()> {
        if !self.db.delete_task(id, date)? {
            bail!("No task {id} on {}", date.format("%Y-%m-%d"));
        }
        log::info!("completed task {id} on {date}");
        self.notifier.notify(NotifyEvent::TaskCompleted);
        board.reload(&self.db)
    }

    // --- Weights ---

    pub fn load_weights(&self, unit: WeightUnit) -> Result<WeightLog> {
        WeightLog::load(&self.db, unit)
    }

    /// Log a weight given in `unit`. It is stored in kilograms.
    pub fn add_weight(
        &self,
        weights: &mut WeightLog,
        value: f64,
        unit: WeightUnit,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<WeightEntry> {
        validate_weight_value(value)?;
        validate_weight_date(date, today)?;

        let value_kg = to_kg(value, unit);
        if unit != WeightUnit::Kg {
            log::info!("converted {value} {unit} to {value_kg} kg");
        }
        let entry = self.db.insert_weight(&NewWeightEntry { value_kg, date })?;
        self.notifier.notify(NotifyEvent::WeightAdded);
        weights.reload(&self.db)?;
        Ok(entry)
    }

    /// Preferred display unit, defaulting to kilograms.
    pub fn display_unit(&self) -> Result<WeightUnit> {
        match self.db.get_setting(WEIGHT_UNIT_SETTING)? {
            Some(s) => s.parse(),
            None => Ok(WeightUnit::default()),
        }
    }

    pub fn set_display_unit(&self, unit: WeightUnit) -> Result<()> {
        self.db.set_setting(WEIGHT_UNIT_SETTING, unit.as_str())
    }

    // --- Export / Import ---

    pub fn export(&self) -> Result<ExportData> {
        self.db.export_all()
    }

    pub fn import(&mut self, data: &ExportData) -> Result<ImportSummary> {
        self.db.import_all(data)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::models::WeightDelta;

    struct RecordingNotifier {
        events: Rc<RefCell<Vec<NotifyEvent>>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, event: NotifyEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    fn recording_service() -> (TaskmanService, Rc<RefCell<Vec<NotifyEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let svc = TaskmanService::new_in_memory()
            .unwrap()
            .with_notifier(Box::new(RecordingNotifier {
                events: Rc::clone(&events),
            }));
        (svc, events)
    }

    #[test]
    fn test_add_task_empty_title_leaves_table_unchanged() {
        let (mut svc, events) = recording_service();
        let mut board = svc.load_tasks(today()).unwrap();

        assert!(svc.add_task(&mut board, "", today(), today()).is_err());
        assert!(svc.add_task(&mut board, "   ", today(), today()).is_err());

        assert_eq!(svc.database().count_tasks().unwrap(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_add_task_too_long_title_rejected() {
        let mut svc = TaskmanService::new_in_memory().unwrap();
        let mut board = svc.load_tasks(today()).unwrap();
        let title = "x".repeat(71);

        assert!(svc.add_task(&mut board, &title, today(), today()).is_err());
        assert_eq!(svc.database().count_tasks().unwrap(), 0);
    }

    #[test]
    fn test_add_task_in_the_past_rejected() {
        let mut svc = TaskmanService::new_in_memory().unwrap();
        let mut board = svc.load_tasks(today()).unwrap();
        let yesterday = today().pred_opt().unwrap();

        assert!(svc.add_task(&mut board, "Too late", yesterday, today()).is_err());
        assert_eq!(svc.database().count_tasks().unwrap(), 0);
    }

    #[test]
    fn test_add_two_then_complete_first() {
        let (mut svc, events) = recording_service();
        let mut board = svc.load_tasks(today()).unwrap();

        let a = svc.add_task(&mut board, "Write report", today(), today()).unwrap();
        let b = svc.add_task(&mut board, "Call mum", today(), today()).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(board.tasks().len(), 2);

        svc.complete_task(&mut board, 1, today()).unwrap();
        let ids: Vec<i64> = board.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(
            *events.borrow(),
            vec![
                NotifyEvent::TaskAdded,
                NotifyEvent::TaskAdded,
                NotifyEvent::TaskCompleted
            ]
        );
    }

    #[test]
    fn test_add_task_switches_displayed_day() {
        let mut svc = TaskmanService::new_in_memory().unwrap();
        let mut board = svc.load_tasks(today()).unwrap();
        let later = today().succ_opt().unwrap();

        svc.add_task(&mut board, "Tomorrow's job", later, today())
            .unwrap();
        assert_eq!(board.date(), later);
        assert_eq!(board.tasks().len(), 1);
        assert!(svc.list_tasks(today()).unwrap().is_empty());
    }

    #[test]
    fn test_complete_missing_task_errors() {
        let (svc, events) = recording_service();
        let mut board = svc.load_tasks(today()).unwrap();
        assert!(svc.complete_task(&mut board, 7, today()).is_err());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_add_weight_in_pounds_stores_kilograms() {
        let (svc, events) = recording_service();
        let mut log = svc.load_weights(WeightUnit::Kg).unwrap();

        let entry = svc
            .add_weight(&mut log, 100.0, WeightUnit::Lb, today(), today())
            .unwrap();
        assert!((entry.value_kg - 45.36).abs() < f64::EPSILON);
        assert_eq!(entry.unit, "KG");
        assert_eq!(log.entries().len(), 1);
        assert_eq!(*events.borrow(), vec![NotifyEvent::WeightAdded]);
    }

    #[test]
    fn test_add_weight_rejects_future_date_and_out_of_range() {
        let svc = TaskmanService::new_in_memory().unwrap();
        let mut log = svc.load_weights(WeightUnit::Kg).unwrap();
        let tomorrow = today().succ_opt().unwrap();

        assert!(
            svc.add_weight(&mut log, 70.0, WeightUnit::Kg, tomorrow, today())
                .is_err()
        );
        assert!(
            svc.add_weight(&mut log, 2.0, WeightUnit::Kg, today(), today())
                .is_err()
        );
        assert!(svc.database().get_weights().unwrap().is_empty());
    }

    #[test]
    fn test_weight_delta_after_two_entries() {
        let svc = TaskmanService::new_in_memory().unwrap();
        let mut log = svc.load_weights(WeightUnit::Kg).unwrap();
        let yesterday = today().pred_opt().unwrap();

        svc.add_weight(&mut log, 80.0, WeightUnit::Kg, yesterday, today())
            .unwrap();
        assert_eq!(log.delta(), None);
        svc.add_weight(&mut log, 78.0, WeightUnit::Kg, today(), today())
            .unwrap();
        assert_eq!(log.delta(), Some(WeightDelta::Lost(2.0)));
    }

    #[test]
    fn test_display_unit_setting() {
        let svc = TaskmanService::new_in_memory().unwrap();
        assert_eq!(svc.display_unit().unwrap(), WeightUnit::Kg);
        svc.set_display_unit(WeightUnit::Lb).unwrap();
        assert_eq!(svc.display_unit().unwrap(), WeightUnit::Lb);
    }

    #[test]
    fn test_export_contains_everything() {
        let mut svc = TaskmanService::new_in_memory().unwrap();
        let mut board = svc.load_tasks(today()).unwrap();
        let mut log = svc.load_weights(WeightUnit::Kg).unwrap();
        svc.add_task(&mut board, "Export me", today(), today())
            .unwrap();
        svc.add_weight(&mut log, 72.0, WeightUnit::Kg, today(), today())
            .unwrap();

        let data = svc.export().unwrap();
        assert_eq!(data.tasks.len(), 1);
        assert_eq!(data.weights.len(), 1);

        let mut other = TaskmanService::new_in_memory().unwrap();
        let summary = other.import(&data).unwrap();
        assert_eq!(summary.tasks_imported, 1);
        assert_eq!(other.list_tasks(today()).unwrap()[0].title, "Export me");
    }

    #[test]
    fn test_light_pound_entry_survives_export_and_import() {
        let svc = TaskmanService::new_in_memory().unwrap();
        let mut log = svc.load_weights(WeightUnit::Lb).unwrap();
        svc.add_weight(&mut log, 10.0, WeightUnit::Lb, today(), today())
            .unwrap();

        let data = svc.export().unwrap();
        let mut other = TaskmanService::new_in_memory().unwrap();
        let summary = other.import(&data).unwrap();
        assert_eq!(summary.weights_imported, 1);

        let stored = other.database().get_weights().unwrap();
        assert!((stored[0].value_kg - 4.54).abs() < f64::EPSILON);
    }
}
