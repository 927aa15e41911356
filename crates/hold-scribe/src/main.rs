//! Hold-Scribe: hold a global hotkey to dictate, release to paste the transcript.

mod app;
mod app_command;
mod config;
mod desktop;
mod error;
mod hotkey_handler;
mod logging;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    desktop::{
        ArboardClipboard, DesktopNotifier, EnigoSynthesizer, PasteKeyGuard, SystemEarcons,
        SystemPermissionGate,
    },
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::TrayManager,
};

use crate::config::Config;

use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::error;

/// Application entry point.
fn main() {
    let log_guard = logging::init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Persists across event loop iterations. Dropping it unregisters the hotkey.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::SetState(state) => {
                        if let Err(e) = tray_manager.update_state(state) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config = match Config::load() {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let controller = match app::build_controller(&config) {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to build controller: {:?}", e);
                        std::process::exit(1);
                    }
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                // Register hotkey on the main thread: tao's event loop pumps
                // the Windows messages needed for WM_HOTKEY delivery.
                let (manager, hotkey_id) =
                    match HotkeyHandler::register_hotkey(&config.hotkey.chord) {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!("Failed to register hotkey: {:?}", e);
                            std::process::exit(1);
                        }
                    };
                hotkey_manager = Some(manager);

                let tray_proxy = tray_proxy.clone();
                let config_menu_id = tray_manager.config_item_id().clone();
                let exit_menu_id = tray_manager.exit_item_id().clone();

                // Tokio runtime on its own thread. TrayManager and
                // hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let hotkey_handler = HotkeyHandler::new(hotkey_id, command_tx.clone());

                        let app = App {
                            controller,
                            tray_proxy,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            config_menu_id,
                            exit_menu_id,
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        // Keep the hotkey registration and log writer alive for the app's lifetime.
        let _ = (&hotkey_manager, &log_guard);
    });
}
