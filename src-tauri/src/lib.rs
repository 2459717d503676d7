use std::sync::Arc;

use tauri::{Manager, RunEvent, State};
use tauri_plugin_store::StoreExt;

#[cfg(target_os = "macos")]
#[macro_use]
extern crate objc;

pub mod config;
pub mod controller;
pub mod handoff;
pub mod launch;
pub mod logging;
pub mod position;
pub mod reminder;
pub mod shell;
pub mod task_store;

mod macos_window;

use crate::config::Config;
use crate::controller::{Controller, ControllerOptions};
use crate::handoff::InstanceFile;
use crate::launch::{LaunchArgs, LaunchPlan};
use crate::position::{MemoryPreferences, PositionManager, PreferenceStore};
use crate::reminder::geometry::Size;
use crate::shell::{AppController, TauriShell};
use crate::task_store::{TaskRecord, TaskStore};

const PREFERENCES_FILE: &str = "preferences.json";

#[tauri::command]
async fn submit_task(
    controller: State<'_, Arc<AppController>>,
    text: String,
) -> Result<(), String> {
    let controller = Arc::clone(&controller);
    // Relaunch mode waits on the child, keep that off the IPC thread
    tauri::async_runtime::spawn_blocking(move || controller.submit(&text))
        .await
        .map_err(|e| format!("Failed to submit task: {}", e))?
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn complete_task(controller: State<'_, Arc<AppController>>) -> Result<(), String> {
    controller.complete();
    Ok(())
}

#[tauri::command]
fn current_task(controller: State<'_, Arc<AppController>>) -> Option<TaskRecord> {
    controller.current_task()
}

#[tauri::command]
async fn fit_reminder(
    controller: State<'_, Arc<AppController>>,
    width: f64,
    height: f64,
) -> Result<(), String> {
    let saved = controller.positions().load_position();
    controller
        .shell()
        .fit_reminder(Size::new(width, height), saved)
        .map_err(|e| format!("Failed to fit reminder: {}", e))
}

/// Durable preferences, or an in-memory map when the store file can't be opened
fn open_preferences(app: &tauri::App) -> Arc<dyn PreferenceStore> {
    match app.store(PREFERENCES_FILE) {
        Ok(store) => store as Arc<dyn PreferenceStore>,
        Err(e) => {
            tracing::warn!(error = %e, "Preferences unavailable, positions won't persist");
            Arc::new(MemoryPreferences::default())
        }
    }
}

#[cfg(desktop)]
fn apply_autostart(app: &tauri::App, enable: bool) {
    use tauri_plugin_autostart::ManagerExt;

    let autolaunch = app.autolaunch();
    let result = if enable {
        autolaunch.enable()
    } else {
        autolaunch.disable()
    };
    match result {
        Ok(()) => tracing::info!(enable, "Updated login item"),
        Err(e) => tracing::error!(error = %e, enable, "Failed to update login item"),
    }
}

fn setup_app(
    app: &tauri::App,
    config: Config,
    store: TaskStore,
    args: LaunchArgs,
    plan: LaunchPlan,
) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(desktop)]
    {
        app.handle()
            .plugin(tauri_plugin_autostart::init(
                tauri_plugin_autostart::MacosLauncher::LaunchAgent,
                Some(vec!["--prompt"]),
            ))
            .map_err(|e| {
                tracing::error!(error = %e, "Error initializing autostart plugin");
                e
            })?;

        if let Some(enable) = args.autostart_change() {
            apply_autostart(app, enable);
            app.handle().exit(0);
            return Ok(());
        }
    }

    let positions = PositionManager::new(open_preferences(app));
    let controller = Arc::new(Controller::new(
        store,
        positions,
        InstanceFile::new(config.pid_file()),
        ControllerOptions {
            handoff: config.handoff,
            celebration_url: config.celebration_url.clone(),
        },
        TauriShell::new(app.handle().clone(), config),
    ));
    app.manage(Arc::clone(&controller));

    controller.start(plan, args.handoff_ready.as_deref());
    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let args = LaunchArgs::from_env();
    if args.quit {
        return;
    }

    let (config, config_warnings) = Config::from_env_deferred();
    let dirs_result = config.ensure_dirs();
    logging::enable_logging(&config.log_dir());
    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }
    if let Err(e) = dirs_result {
        tracing::warn!(error = %e, dir = %config.data_dir.display(), "Failed to create data directory");
    }
    tracing::info!(?args, data_dir = %config.data_dir.display(), "Launching");

    let store = TaskStore::new(config.task_file());
    let plan = LaunchPlan::decide(&args, || store.load());
    if !plan.shows_surface() && args.autostart_change().is_none() {
        tracing::info!(?plan, "Nothing to show, exiting");
        return;
    }

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_store::Builder::new().build())
        .setup(move |app| setup_app(app, config, store, args, plan))
        .invoke_handler(tauri::generate_handler![
            submit_task,
            complete_task,
            current_task,
            fit_reminder
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|_app, event| {
        // Destroying the prompt on handoff closes the last window for a moment
        if let RunEvent::ExitRequested {
            code: None, api, ..
        } = event
        {
            api.prevent_exit();
        }
    });
}
