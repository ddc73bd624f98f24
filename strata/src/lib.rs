#![warn(clippy::pedantic)]

pub mod i18n;
pub mod ui;

use std::sync::Arc;

use strata_core::{
    adapters::CanvasAdapters, api::CanvasStateApi, cells::InteractionCells, config::Preferences,
    queue::InMemoryQueue, state::CanvasState, store::CanvasStore,
};

/// Log to a terminal, if available. Else, log to "log.out" in the working directory.
pub fn init_logging() -> anyhow::Result<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .try_init()?;
    } else {
        simple_logging::log_to_file("log.out", log::LevelFilter::Debug)?;
    }
    Ok(())
}

/// A blank canvas seeded from `preferences`, with no adapters mounted and a local queue.
#[must_use]
pub fn canvas_api(preferences: &Preferences) -> Arc<CanvasStateApi> {
    let store = Arc::new(CanvasStore::new(CanvasState::from_preferences(preferences)));
    Arc::new(CanvasStateApi::new(
        store,
        Arc::new(CanvasAdapters::default()),
        Arc::new(InMemoryQueue::new()),
        Arc::new(InteractionCells::new()),
    ))
}

#[cfg(test)]
mod test {
    use strata_core::{color::RgbaColor, config::Preferences};

    #[test]
    fn api_starts_from_preferences() {
        let preferences = Preferences {
            brush_width: 3.0,
            fill: RgbaColor::rgb(200, 10, 10),
            ..Default::default()
        };
        let api = super::canvas_api(&preferences);
        let tool = api.get_tool_state();
        assert_eq!(tool.brush.width, 3.0);
        assert_eq!(tool.fill, preferences.fill);
        assert_eq!(api.tool_state.get().fill, preferences.fill);
        assert_eq!(*api.get_settings(), preferences.canvas);
        assert!(!api.is_busy());
    }
}
