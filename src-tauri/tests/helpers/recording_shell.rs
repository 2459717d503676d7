use std::sync::Mutex;

use one_big_thing_lib::controller::{Presentation, Shell};
use one_big_thing_lib::reminder::geometry::Point;
use one_big_thing_lib::task_store::TaskRecord;

/// Shell that records every side effect as a short string
#[derive(Default)]
pub struct RecordingShell {
    pub(crate) calls: Mutex<Vec<String>>,
    /// Fail `open_url` the way a machine without the handler would
    pub no_url_handler: bool,
}

impl RecordingShell {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exited(&self) -> bool {
        self.calls().iter().any(|c| c == "exit")
    }
}

impl Shell for RecordingShell {
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

    fn show_reminder(&self, task: &TaskRecord, saved_origin: Option<Point>) -> anyhow::Result<()> {
        match saved_origin {
            Some(p) => self.record(format!("show_reminder:{}@{},{}", task.text, p.x, p.y)),
            None => self.record(format!("show_reminder:{}", task.text)),
        }
        Ok(())
    }

    fn hide_reminder(&self) {
        self.record("hide_reminder");
    }

    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        self.record(format!("open:{url}"));
        if self.no_url_handler {
            anyhow::bail!("no application can open {url}");
        }
        Ok(())
    }

    fn relaunch_into_reminder(&self) -> anyhow::Result<()> {
        self.record("relaunch");
        Ok(())
    }

    fn exit(&self) {
        self.record("exit");
    }
}
