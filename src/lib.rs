pub mod indicator;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod observable;
pub mod overlay;
pub mod pane_group;
pub mod scheduler;
pub mod surface;
pub mod sync;
pub mod timeframe;

/// 설정 로더
pub mod config_loader;

/// 프리셋/지표 설정
pub mod config;

pub use normalize::normalize_bars;
pub use pane_group::{PaneData, PaneGroup};
