//! Capture session lifecycle: open, configure, repeat preview, stop

pub mod controller;
pub mod notice;
pub mod request;
pub mod state;

pub use controller::{SessionController, SessionSettings, SessionSnapshot};
pub use notice::{NoticeKind, SessionNotice};
pub use request::{fallback_zoom_ratio, PreviewRequest, ZoomPolicy};
pub use state::{next_phase, SessionEvent, SessionPhase};
