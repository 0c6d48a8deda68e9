//! Browser facade
//!
//! The page owns the map, popups, buttons and the geolocation watch; it
//! forwards each event here as a text command and redraws from the JSON view
//! it gets back.

use wasm_bindgen::prelude::*;

use crate::persistence::LocalStorageStore;
use crate::sim::{Command, Controller, View};
use crate::settings::WorldConfig;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Geocoin starting...");
}

#[wasm_bindgen]
pub struct WebGame {
    controller: Controller<LocalStorageStore>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebGame, JsValue> {
        let store = LocalStorageStore::open().map_err(|e| JsValue::from_str(&e.to_string()))?;
        let controller = Controller::load(WorldConfig::load(), store);
        Ok(WebGame { controller })
    }

    /// Apply a text command (`north`, `collect 3 -2`, `reset`, ...)
    ///
    /// Returns `{"ok": bool, "error": string|null, "view": View}`.
    pub fn command(&mut self, line: &str) -> String {
        match line.parse::<Command>() {
            Ok(command) => self.dispatch(command),
            Err(e) => Self::respond(Some(e), &self.controller.view()),
        }
    }

    /// Geolocation watch success callback
    pub fn position_update(&mut self, lat: f64, lng: f64) -> String {
        self.dispatch(Command::PositionUpdate { lat, lng })
    }

    /// Geolocation watch error callback
    pub fn position_error(&mut self) -> String {
        self.dispatch(Command::PositionUnavailable)
    }

    /// Full view; its `changes` are consumed, so the first call carries the
    /// startup window
    pub fn view(&mut self) -> String {
        serde_json::to_string(&self.controller.take_view()).unwrap_or_default()
    }

    fn dispatch(&mut self, command: Command) -> String {
        match self.controller.apply(command) {
            Ok(view) => Self::respond(None, &view),
            Err(e) => {
                if e.is_rejection() {
                    log::info!("Rejected {:?}: {}", command, e);
                } else {
                    log::error!("{:?} failed: {}", command, e);
                }
                Self::respond(Some(e.to_string()), &self.controller.view())
            }
        }
    }

    fn respond(error: Option<String>, view: &View) -> String {
        serde_json::json!({
            "ok": error.is_none(),
            "error": error,
            "view": view,
        })
        .to_string()
    }
}
