// Tauri implementation of the controller's window-system side effects

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use tauri::async_runtime::JoinHandle;
use tauri::{
    AppHandle, Emitter, LogicalPosition, LogicalSize, Manager, Monitor, WebviewUrl,
    WebviewWindow, WebviewWindowBuilder, WindowEvent, Wry,
};
use tauri_plugin_opener::OpenerExt;

use crate::config::Config;
use crate::controller::{Controller, Presentation, Shell};
use crate::handoff;
use crate::macos_window::{self, WindowLevel};
use crate::position::PreferenceStore;
use crate::reminder::drag::DragSettler;
use crate::reminder::geometry::{Point, Rect, ReminderLayout, Size};
use crate::reminder::heartbeat::{run_heartbeat, HeartbeatSchedule, Pulse, PulseSink, EVENT_PULSE};
use crate::task_store::TaskRecord;

pub const PROMPT_WINDOW_LABEL: &str = "prompt";
pub const REMINDER_WINDOW_LABEL: &str = "reminder";

/// Toast size used until the front-end reports its measured size
const DEFAULT_CONTENT_SIZE: Size = Size::new(460.0, 100.0);

pub type AppController = Controller<TauriShell, Arc<dyn PreferenceStore>>;

pub struct TauriShell {
    app: AppHandle<Wry>,
    config: Config,
    layout: ReminderLayout,
    drag: DragSettler,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl TauriShell {
    pub fn new(app: AppHandle<Wry>, config: Config) -> Self {
        Self {
            app,
            config,
            layout: ReminderLayout::default(),
            drag: DragSettler::default(),
            heartbeat: Mutex::new(None),
        }
    }

    fn primary_monitor(&self) -> Option<Monitor> {
        match self.app.primary_monitor() {
            Ok(monitor) => monitor,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to query primary monitor");
                None
            }
        }
    }

    /// Resize the reminder to fit `content` and re-place it
    pub fn fit_reminder(&self, content: Size, saved_origin: Option<Point>) -> anyhow::Result<()> {
        let window = self
            .app
            .get_webview_window(REMINDER_WINDOW_LABEL)
            .context("reminder window is not open")?;

        let size = self.layout.window_size(content);
        let area = window
            .current_monitor()
            .ok()
            .flatten()
            .or_else(|| self.primary_monitor())
            .map(|m| work_area(&m));
        let origin = self.layout.placement(saved_origin, size, area);

        self.drag.expect_move(origin);
        window.set_size(LogicalSize::new(size.width, size.height))?;
        window.set_position(LogicalPosition::new(origin.x, origin.y))?;
        tracing::debug!(?size, ?origin, "Fitted reminder to content");
        Ok(())
    }

    fn replace_heartbeat(&self, next: Option<JoinHandle<()>>) {
        let mut slot = self.heartbeat.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = next;
    }
}

impl Shell for TauriShell {
    fn set_presentation(&self, presentation: Presentation) {
        #[cfg(target_os = "macos")]
        {
            let policy = match presentation {
                Presentation::Foreground => tauri::ActivationPolicy::Regular,
                Presentation::Accessory => tauri::ActivationPolicy::Accessory,
            };
            if let Err(e) = self.app.set_activation_policy(policy) {
                tracing::warn!(error = %e, ?presentation, "Failed to change activation policy");
            }
        }
        tracing::debug!(?presentation, "Presentation changed");
    }

    fn show_blocking_prompt(&self) -> anyhow::Result<()> {
        let monitor = self
            .primary_monitor()
            .ok_or_else(|| anyhow!("no primary display"))?;
        let scale = monitor.scale_factor();
        let position = monitor.position().to_logical::<f64>(scale);
        let size = monitor.size().to_logical::<f64>(scale);

        let window = WebviewWindowBuilder::new(
            &self.app,
            PROMPT_WINDOW_LABEL,
            WebviewUrl::App("prompt.html".into()),
        )
        .title("One Big Thing")
        .decorations(false)
        .transparent(true)
        .always_on_top(true)
        .resizable(false)
        .minimizable(false)
        .maximizable(false)
        .closable(false)
        .skip_taskbar(true)
        .visible_on_all_workspaces(true)
        .position(position.x, position.y)
        .inner_size(size.width, size.height)
        .visible(false)
        .build()?;

        // Escape and Cmd+W must not get rid of the prompt
        window.on_window_event(|event| {
            if let WindowEvent::CloseRequested { api, .. } = event {
                api.prevent_close();
            }
        });

        window.show()?;
        macos_window::configure_overlay(&window, WindowLevel::ScreenSaver);
        window.set_focus()?;
        tracing::info!("Blocking prompt shown");
        Ok(())
    }

    fn close_blocking_prompt(&self) {
        if let Some(window) = self.app.get_webview_window(PROMPT_WINDOW_LABEL) {
            if let Err(e) = window.destroy() {
                tracing::warn!(error = %e, "Failed to close blocking prompt");
            }
        }
    }

    fn show_reminder(&self, task: &TaskRecord, saved_origin: Option<Point>) -> anyhow::Result<()> {
        let size = self.layout.window_size(DEFAULT_CONTENT_SIZE);
        let area = self.primary_monitor().map(|m| work_area(&m));
        if area.is_none() {
            tracing::warn!("No display information, using fallback position");
        }
        let origin = self.layout.placement(saved_origin, size, area);
        tracing::info!(task = %task.text, ?origin, "Showing reminder");
        self.drag.expect_move(origin);

        let window = WebviewWindowBuilder::new(
            &self.app,
            REMINDER_WINDOW_LABEL,
            WebviewUrl::App("reminder.html".into()),
        )
        .title("One Big Thing")
        .decorations(false)
        .transparent(true)
        .shadow(false)
        .always_on_top(true)
        .resizable(false)
        .minimizable(false)
        .maximizable(false)
        .skip_taskbar(true)
        .visible_on_all_workspaces(true)
        .focused(false)
        .inner_size(size.width, size.height)
        .position(origin.x, origin.y)
        .visible(false)
        .build()?;

        let app = self.app.clone();
        let layout = self.layout;
        let drag = self.drag.clone();
        let moved_window = window.clone();
        window.on_window_event(move |event| match event {
            WindowEvent::Moved(_) => reminder_moved(&app, &moved_window, layout, &drag),
            WindowEvent::CloseRequested { api, .. } => api.prevent_close(),
            _ => {}
        });

        window.show()?;
        macos_window::configure_overlay(&window, WindowLevel::Floating);

        let schedule = HeartbeatSchedule::with_interval(self.config.heartbeat_interval);
        let heartbeat = tauri::async_runtime::spawn(run_heartbeat(schedule, WindowPulses(window)));
        self.replace_heartbeat(Some(heartbeat));
        Ok(())
    }

    fn hide_reminder(&self) {
        self.replace_heartbeat(None);
        if let Some(window) = self.app.get_webview_window(REMINDER_WINDOW_LABEL) {
            if let Err(e) = window.hide() {
                tracing::warn!(error = %e, "Failed to hide reminder");
            }
            if let Err(e) = window.destroy() {
                tracing::warn!(error = %e, "Failed to close reminder");
            }
        }
    }

    fn open_url(&self, url: &str) -> anyhow::Result<()> {
        self.app.opener().open_url(url, None::<&str>)?;
        Ok(())
    }

    fn relaunch_into_reminder(&self) -> anyhow::Result<()> {
        let pid = handoff::relaunch_into_reminder(&self.config.data_dir, handoff::READY_TIMEOUT)?;
        tracing::info!(pid, "Reminder instance confirmed handoff");
        Ok(())
    }

    fn exit(&self) {
        tracing::info!("Exiting");
        self.app.exit(0);
    }
}

/// Delivers heartbeat pulses to the reminder front-end
struct WindowPulses(WebviewWindow<Wry>);

impl PulseSink for WindowPulses {
    fn pulse(&self, pulse: Pulse) {
        if let Err(e) = self.0.emit(EVENT_PULSE, pulse) {
            tracing::warn!(error = %e, "Failed to emit heartbeat pulse");
        }
    }
}

/// Monitor work area (excludes menu bar and Dock) in logical pixels
fn work_area(monitor: &Monitor) -> Rect {
    let scale = monitor.scale_factor();
    let area = monitor.work_area();
    let position = area.position.to_logical::<f64>(scale);
    let size = area.size.to_logical::<f64>(scale);
    Rect::new(position.x, position.y, size.width, size.height)
}

fn logical_frame(window: &WebviewWindow<Wry>) -> Option<Rect> {
    let scale = window.scale_factor().ok()?;
    let position = window.outer_position().ok()?.to_logical::<f64>(scale);
    let size = window.outer_size().ok()?.to_logical::<f64>(scale);
    Some(Rect::new(position.x, position.y, size.width, size.height))
}

/// Keep the toast on screen while dragging and save the origin once the drag settles
fn reminder_moved(
    app: &AppHandle<Wry>,
    window: &WebviewWindow<Wry>,
    layout: ReminderLayout,
    drag: &DragSettler,
) {
    let Some(frame) = logical_frame(window) else {
        return;
    };
    let mut origin = frame.origin;

    if let Some(area) = window.current_monitor().ok().flatten().map(|m| work_area(&m)) {
        if let Some(fixed) = layout.constrain(frame, area) {
            if let Err(e) = window.set_position(LogicalPosition::new(fixed.x, fixed.y)) {
                tracing::warn!(error = %e, "Failed to keep reminder on screen");
            }
            origin = fixed;
        }
    }

    let app = app.clone();
    drag.moved(origin, move |settled| {
        if let Some(controller) = app.try_state::<Arc<AppController>>() {
            controller.reminder_moved(settled);
        }
    });
}
