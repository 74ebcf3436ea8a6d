// src/panel/mod.rs
//! Admin panel: state machine, pure rendering and the backend it drives.
//!
//! Flow: controller action → `PanelState` → `view::render` → `html::to_html`.

pub mod backend;
pub mod controller;
pub mod html;
pub mod markup;
pub mod routes;
pub mod state;
pub mod view;

pub use backend::{BackendError, HttpBackend, PanelBackend, ServiceBackend};
pub use controller::PanelController;
pub use state::{ContactForm, DealForm, LoadMode, PanelState};
pub use view::{render, PanelView};
