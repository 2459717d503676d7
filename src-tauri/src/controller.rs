//! Launch-to-exit state machine.
//!
//! `Init -> {BlockingPrompt | FloatingReminder} -> Terminated`
//!
//! The controller owns the daily task lifecycle and drives the window system
//! through the [`Shell`] trait, so the whole flow runs in tests with a fake
//! shell. Services (store, positions, instance file) are injected at
//! construction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::config::HandoffMode;
use crate::handoff::{self, InstanceFile};
use crate::launch::LaunchPlan;
use crate::position::{PositionManager, PreferenceStore};
use crate::reminder::geometry::Point;
use crate::task_store::{TaskRecord, TaskStore};

/// App presentation category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Regular app with a Dock icon that can take keyboard focus
    Foreground,
    /// Background accessory app, no Dock icon
    Accessory,
}

/// Window-system side effects the controller needs.
///
/// Every method is best effort. Fallible ones report errors so the
/// controller can log them and pick the fallback path.
pub trait Shell: Send + Sync {
    fn set_presentation(&self, presentation: Presentation);
    fn show_blocking_prompt(&self) -> anyhow::Result<()>;
    fn close_blocking_prompt(&self);
    fn show_reminder(&self, task: &TaskRecord, saved_origin: Option<Point>) -> anyhow::Result<()>;
    fn hide_reminder(&self);
    fn open_url(&self, url: &str) -> anyhow::Result<()>;
    /// Start a reminder instance and wait for it to confirm it is showing
    fn relaunch_into_reminder(&self) -> anyhow::Result<()>;
    fn exit(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Init,
    BlockingPrompt,
    FloatingReminder(TaskRecord),
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("task text is empty")]
    EmptyTask,
    #[error("not waiting for a task")]
    NotPrompting,
}

pub struct ControllerOptions {
    pub handoff: HandoffMode,
    pub celebration_url: Option<String>,
}

pub struct Controller<S, P> {
    store: TaskStore,
    positions: PositionManager<P>,
    instance: InstanceFile,
    options: ControllerOptions,
    phase: Mutex<Phase>,
    shell: S,
}

impl<S: Shell, P: PreferenceStore> Controller<S, P> {
    pub fn new(
        store: TaskStore,
        positions: PositionManager<P>,
        instance: InstanceFile,
        options: ControllerOptions,
        shell: S,
    ) -> Self {
        Self {
            store,
            positions,
            instance,
            options,
            phase: Mutex::new(Phase::Init),
            shell,
        }
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn positions(&self) -> &PositionManager<P> {
        &self.positions
    }

    pub fn phase(&self) -> Phase {
        self.lock_phase().clone()
    }

    /// Task shown by the reminder, if the reminder is up
    pub fn current_task(&self) -> Option<TaskRecord> {
        match &*self.lock_phase() {
            Phase::FloatingReminder(task) => Some(task.clone()),
            _ => None,
        }
    }

    /// Act on the launch decision. `ready_file` is the handoff confirmation
    /// path when this process was spawned by a relaunch.
    pub fn start(&self, plan: LaunchPlan, ready_file: Option<&Path>) -> Phase {
        tracing::info!(?plan, "Starting");
        match plan {
            LaunchPlan::Quit => self.terminate(),
            LaunchPlan::NothingToDo => {
                tracing::info!("No task for today, nothing to show");
                self.terminate()
            }
            LaunchPlan::BlockingPrompt => self.enter_prompt(),
            LaunchPlan::FloatingReminder(task) => {
                let phase = self.enter_reminder(task);
                if let (Phase::FloatingReminder(_), Some(path)) = (&phase, ready_file) {
                    if let Err(e) = handoff::confirm_ready(path) {
                        tracing::warn!(error = %e, "Failed to confirm handoff");
                    }
                }
                phase
            }
        }
    }

    /// Accept the text typed into the blocking prompt
    pub fn submit(&self, text: &str) -> Result<Phase, SubmitError> {
        if *self.lock_phase() != Phase::BlockingPrompt {
            return Err(SubmitError::NotPrompting);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyTask);
        }

        tracing::info!(task = %text, "Task submitted");
        // A failed write is logged by the store; carry on as if saved
        let record = self
            .store
            .save(text)
            .unwrap_or_else(|| TaskRecord::created_now(text));

        self.shell.close_blocking_prompt();

        let phase = match self.options.handoff {
            HandoffMode::InProcess => self.enter_reminder(record),
            HandoffMode::Relaunch => {
                if let Err(e) = self.shell.relaunch_into_reminder() {
                    tracing::error!(error = %e, "Relaunch handoff failed");
                }
                self.terminate()
            }
        };
        Ok(phase)
    }

    /// The user pressed "Complete" on the reminder
    pub fn complete(&self) -> Phase {
        tracing::info!("Task completed");
        self.shell.hide_reminder();
        self.store.clear();
        self.instance.release();

        if let Some(url) = &self.options.celebration_url {
            if let Err(e) = self.shell.open_url(url) {
                tracing::debug!(error = %e, %url, "Celebration unavailable");
            }
        }

        self.terminate()
    }

    /// The user finished dragging the reminder to `origin`
    pub fn reminder_moved(&self, origin: Point) {
        tracing::debug!(x = origin.x, y = origin.y, "Saving reminder position");
        self.positions.save_position(origin);
    }

    fn enter_prompt(&self) -> Phase {
        self.shell.set_presentation(Presentation::Foreground);
        match self.shell.show_blocking_prompt() {
            Ok(()) => self.set_phase(Phase::BlockingPrompt),
            Err(e) => {
                tracing::error!(error = %e, "Cannot show blocking prompt");
                self.terminate()
            }
        }
    }

    fn enter_reminder(&self, task: TaskRecord) -> Phase {
        self.shell.set_presentation(Presentation::Accessory);

        if let Err(e) = self.instance.claim() {
            tracing::warn!(error = %e, "Failed to record reminder instance");
        }

        // The reminder page asks for the current task as soon as it loads
        let saved_origin = self.positions.load_position();
        let phase = self.set_phase(Phase::FloatingReminder(task.clone()));
        match self.shell.show_reminder(&task, saved_origin) {
            Ok(()) => phase,
            Err(e) => {
                tracing::error!(error = %e, "Cannot show reminder");
                self.instance.release();
                self.terminate()
            }
        }
    }

    fn terminate(&self) -> Phase {
        let phase = self.set_phase(Phase::Terminated);
        self.shell.exit();
        phase
    }

    fn set_phase(&self, phase: Phase) -> Phase {
        *self.lock_phase() = phase.clone();
        phase
    }

    fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::MemoryPreferences;
    use std::sync::{Arc, Mutex, OnceLock, Weak};
    use tempfile::TempDir;

    type TestController = Controller<FakeShell, MemoryPreferences>;

    #[derive(Default)]
    struct FakeShell {
        calls: Mutex<Vec<String>>,
        fail_reminder: bool,
        /// Lets `show_reminder` look at the controller the way the page does
        controller: OnceLock<Weak<TestController>>,
        task_seen_by_page: Mutex<Option<Option<TaskRecord>>>,
    }

    impl FakeShell {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Shell for FakeShell {
        fn set_presentation(&self, presentation: Presentation) {
            self.record(format!("presentation:{presentation:?}"));
        }
        fn show_blocking_prompt(&self) -> anyhow::Result<()> {
            self.record("show_prompt");
            Ok(())
        }
        fn close_blocking_prompt(&self) {
            self.record("close_prompt");
        }
        fn show_reminder(&self, task: &TaskRecord, origin: Option<Point>) -> anyhow::Result<()> {
            self.record(format!("show_reminder:{}:{:?}", task.text, origin));
            if let Some(controller) = self.controller.get().and_then(Weak::upgrade) {
                *self.task_seen_by_page.lock().unwrap() = Some(controller.current_task());
            }
            if self.fail_reminder {
                anyhow::bail!("no display");
            }
            Ok(())
        }
        fn hide_reminder(&self) {
            self.record("hide_reminder");
        }
        fn open_url(&self, url: &str) -> anyhow::Result<()> {
            self.record(format!("open:{url}"));
            anyhow::bail!("no handler for {url}")
        }
        fn relaunch_into_reminder(&self) -> anyhow::Result<()> {
            self.record("relaunch");
            Ok(())
        }
        fn exit(&self) {
            self.record("exit");
        }
    }

    fn controller(
        temp: &TempDir,
        handoff: HandoffMode,
        shell: FakeShell,
    ) -> TestController {
        crate::logging::init_test_logging();
        Controller::new(
            TaskStore::new(temp.path().join("current-task.json")),
            PositionManager::new(MemoryPreferences::default()),
            InstanceFile::new(temp.path().join("reminder.pid")),
            ControllerOptions {
                handoff,
                celebration_url: Some("confetti://now".to_string()),
            },
            shell,
        )
    }

    #[test]
    fn prompt_submission_switches_to_reminder_in_process() {
        let temp = TempDir::new().unwrap();
        let c = controller(&temp, HandoffMode::InProcess, FakeShell::default());

        assert_eq!(c.start(LaunchPlan::BlockingPrompt, None), Phase::BlockingPrompt);
        let phase = c.submit("  Ship the release ").unwrap();

        let stored = TaskStore::new(temp.path().join("current-task.json")).load().unwrap();
        assert_eq!(stored.text, "Ship the release");
        assert_eq!(phase, Phase::FloatingReminder(stored.clone()));
        assert_eq!(c.current_task(), Some(stored));
        assert_eq!(
            c.shell().calls(),
            vec![
                "presentation:Foreground",
                "show_prompt",
                "close_prompt",
                "presentation:Accessory",
                "show_reminder:Ship the release:None",
            ]
        );
    }

    #[test]
    fn empty_submission_keeps_prompt() {
        let temp = TempDir::new().unwrap();
        let c = controller(&temp, HandoffMode::InProcess, FakeShell::default());
        c.start(LaunchPlan::BlockingPrompt, None);

        assert_eq!(c.submit("   \n"), Err(SubmitError::EmptyTask));
        assert_eq!(c.phase(), Phase::BlockingPrompt);
        assert!(!temp.path().join("current-task.json").exists());
        assert!(!c.shell().calls().contains(&"close_prompt".to_string()));
    }

    #[test]
    fn submission_outside_prompt_is_rejected() {
        let temp = TempDir::new().unwrap();
        let c = controller(&temp, HandoffMode::InProcess, FakeShell::default());

        assert_eq!(c.submit("Anything"), Err(SubmitError::NotPrompting));
    }

    #[test]
    fn relaunch_mode_hands_off_and_exits() {
        let temp = TempDir::new().unwrap();
        let c = controller(&temp, HandoffMode::Relaunch, FakeShell::default());
        c.start(LaunchPlan::BlockingPrompt, None);

        assert_eq!(c.submit("Write the report").unwrap(), Phase::Terminated);
        let calls = c.shell().calls();
        assert_eq!(&calls[2..], &["close_prompt", "relaunch", "exit"]);
        // Saved before the handoff began
        assert!(TaskStore::new(temp.path().join("current-task.json")).load().is_some());
    }

    #[test]
    fn completion_clears_task_celebrates_and_exits() {
        let temp = TempDir::new().unwrap();
        let c = controller(&temp, HandoffMode::InProcess, FakeShell::default());
        let store = TaskStore::new(temp.path().join("current-task.json"));
        let task = store.save("Finish slides").unwrap();

        c.start(LaunchPlan::FloatingReminder(task), None);
        assert_eq!(c.complete(), Phase::Terminated);

        assert!(store.load().is_none());
        assert!(!temp.path().join("reminder.pid").exists());
        let calls = c.shell().calls();
        assert_eq!(
            &calls[calls.len() - 3..],
            &["hide_reminder", "open:confetti://now", "exit"]
        );
    }

    #[test]
    fn reminder_restores_saved_position() {
        let temp = TempDir::new().unwrap();
        let c = controller(&temp, HandoffMode::InProcess, FakeShell::default());
        c.reminder_moved(Point::new(40.0, 60.0));

        c.start(
            LaunchPlan::FloatingReminder(TaskRecord::created_now("Plan")),
            None,
        );
        assert!(c
            .shell()
            .calls()
            .contains(&"show_reminder:Plan:Some(Point { x: 40.0, y: 60.0 })".to_string()));
    }

    #[test]
    fn reminder_confirms_handoff() {
        let temp = TempDir::new().unwrap();
        let c = controller(&temp, HandoffMode::InProcess, FakeShell::default());
        let ready = temp.path().join("handoff.ready");

        c.start(
            LaunchPlan::FloatingReminder(TaskRecord::created_now("Plan")),
            Some(&ready),
        );

        let pid: u32 = std::fs::read_to_string(&ready).unwrap().parse().unwrap();
        assert_eq!(pid, std::process::id());
    }

    #[test]
    fn reminder_failure_terminates_without_confirming() {
        let temp = TempDir::new().unwrap();
        let shell = FakeShell {
            fail_reminder: true,
            ..FakeShell::default()
        };
        let c = controller(&temp, HandoffMode::InProcess, shell);
        let ready = temp.path().join("handoff.ready");

        let phase = c.start(
            LaunchPlan::FloatingReminder(TaskRecord::created_now("Plan")),
            Some(&ready),
        );

        assert_eq!(phase, Phase::Terminated);
        assert!(!ready.exists());
        assert_eq!(c.shell().calls().last().map(String::as_str), Some("exit"));
    }

    #[test]
    fn quit_and_nothing_to_do_exit_without_surfaces() {
        for plan in [LaunchPlan::Quit, LaunchPlan::NothingToDo] {
            let temp = TempDir::new().unwrap();
            let c = controller(&temp, HandoffMode::InProcess, FakeShell::default());

            assert_eq!(c.start(plan, None), Phase::Terminated);
            assert_eq!(c.shell().calls(), vec!["exit"]);
        }
    }

    #[test]
    fn reminder_page_sees_task_while_window_opens() {
        let temp = TempDir::new().unwrap();
        let c = Arc::new(controller(&temp, HandoffMode::InProcess, FakeShell::default()));
        assert!(c.shell().controller.set(Arc::downgrade(&c)).is_ok());

        c.start(LaunchPlan::BlockingPrompt, None);
        c.submit("Ship the release").unwrap();

        let seen = c.shell().task_seen_by_page.lock().unwrap().clone();
        let seen = seen.expect("show_reminder should have run");
        assert_eq!(seen.map(|t| t.text).as_deref(), Some("Ship the release"));
    }

    #[test]
    fn failed_reminder_does_not_leave_task_visible() {
        let temp = TempDir::new().unwrap();
        let shell = FakeShell {
            fail_reminder: true,
            ..FakeShell::default()
        };
        let c = controller(&temp, HandoffMode::InProcess, shell);

        c.start(LaunchPlan::FloatingReminder(TaskRecord::created_now("Plan")), None);
        assert_eq!(c.current_task(), None);
        assert_eq!(c.phase(), Phase::Terminated);
    }
}
