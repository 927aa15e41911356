//! System tray icon with state-based updates.
//!
//! One glyph per controller state, a status line, and a context menu to open
//! the config file or exit.

use crate::{AppError, AppResult, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Edge length of the generated tray glyph, in pixels.
pub(crate) const ICON_SIZE: u32 = 32;

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    status_item: MenuItem,
    config_item_id: MenuId,
    exit_item_id: MenuId,
}

impl TrayManager {
    /// Create a new tray manager in the idle state.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let status_item = MenuItem::new(TrayIconState::Idle.tooltip(), false, None);
        let config_item = MenuItem::new("Open config file", true, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let config_id = config_item.id().clone();
        let exit_id = exit_item.id().clone();

        menu.append_items(&[
            &status_item,
            &PredefinedMenuItem::separator(),
            &config_item,
            &exit_item,
        ])
        .map_err(|e| AppError::TrayError {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let icon = Self::load_icon(TrayIconState::Idle)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(TrayIconState::Idle.tooltip())
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            status_item,
            config_item_id: config_id,
            exit_item_id: exit_id,
        })
    }

    /// Update the icon, tooltip and status line.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        let icon = Self::load_icon(state)?;

        self.tray_icon
            .set_icon(Some(icon))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(state.tooltip()))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.status_item.set_text(state.tooltip());

        Ok(())
    }

    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        Icon::from_rgba(render_icon(state), ICON_SIZE, ICON_SIZE).map_err(|e| {
            AppError::TrayError {
                reason: format!("Failed to create icon from RGBA: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    /// Get the "Open config file" menu item ID.
    pub fn config_item_id(&self) -> &MenuId {
        &self.config_item_id
    }

    /// Get the exit menu item ID.
    pub fn exit_item_id(&self) -> &MenuId {
        &self.exit_item_id
    }
}

/// RGBA8 pixels of a filled disc in the state's colour on a transparent field.
pub(crate) fn render_icon(state: TrayIconState) -> Vec<u8> {
    let [r, g, b] = state.color();
    let size = ICON_SIZE as f32;
    let center = size / 2.0;
    let radius = center - 2.0;

    let mut pixels = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);
    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            // One pixel of anti-aliasing at the rim.
            let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
            pixels.extend_from_slice(&[r, g, b, (coverage * 255.0).round() as u8]);
        }
    }
    pixels
}
