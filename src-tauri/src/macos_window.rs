use tauri::{Runtime, WebviewWindow};

/// NSWindow levels used by the two surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLevel {
    /// kCGFloatingWindowLevel, above normal app windows
    Floating,
    /// kCGScreenSaverWindowLevel, above the Dock and menu bar
    ScreenSaver,
}

impl WindowLevel {
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    fn raw(self) -> i64 {
        match self {
            WindowLevel::Floating => 3,
            WindowLevel::ScreenSaver => 1000,
        }
    }
}

/// Raise the window to `level`, show it on every Space (including next to
/// full-screen apps) and order it front even when the app is not active.
#[cfg(target_os = "macos")]
pub fn configure_overlay<R: Runtime>(window: &WebviewWindow<R>, level: WindowLevel) {
    use cocoa::appkit::{NSWindow, NSWindowCollectionBehavior};
    use cocoa::base::NO;

    let win = window.clone();
    let result = window.run_on_main_thread(move || unsafe {
        let ns_window = match win.ns_window() {
            Ok(ptr) => ptr as cocoa::base::id,
            Err(e) => {
                tracing::warn!(error = %e, "No native window to configure");
                return;
            }
        };
        ns_window.setLevel_(level.raw());
        ns_window.setCollectionBehavior_(
            NSWindowCollectionBehavior::NSWindowCollectionBehaviorCanJoinAllSpaces
                | NSWindowCollectionBehavior::NSWindowCollectionBehaviorFullScreenAuxiliary,
        );
        let _: () = msg_send![ns_window, setHasShadow: NO];
        let _: () = msg_send![ns_window, orderFrontRegardless];
    });

    if let Err(e) = result {
        tracing::warn!(error = %e, ?level, "Failed to configure overlay window");
    } else {
        tracing::debug!(?level, label = window.label(), "Configured overlay window");
    }
}

#[cfg(not(target_os = "macos"))]
pub fn configure_overlay<R: Runtime>(window: &WebviewWindow<R>, level: WindowLevel) {
    tracing::debug!(?level, label = window.label(), "Window levels are macOS only");
}
