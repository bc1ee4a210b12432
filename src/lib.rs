//! A bound record editor: load a record into editable fields, track dirty and per-field
//! change state, run validation rules and notify observers, independent of any UI framework.
//!
//! ```
//! use record_edit::{weather_forecast::WeatherForecast, RecordEditContext};
//!
//! let mut ctx = RecordEditContext::with_record(WeatherForecast::default());
//! let _s = ctx.on_edit_state_updated(|is_dirty| println!("dirty: {is_dirty}"));
//!
//! ctx.set(WeatherForecast::SUMMARY, "Sunny".to_string()).unwrap();
//! assert!(ctx.is_dirty());
//! assert!(ctx.is_changed("Summary"));
//!
//! ctx.reset().unwrap();
//! assert!(!ctx.is_dirty());
//! ```
mod context;
mod event;
mod field;
mod property_state;
mod record;
mod service;
mod subscription;
mod validation;

pub mod weather_forecast;

pub use context::*;
pub use event::*;
pub use field::*;
pub use property_state::*;
pub use record::*;
pub use service::*;
pub use subscription::*;
pub use validation::*;
