use strata::{
    i18n::Translations,
    ui::{add_layer_menu, AddLayerMenu, LayerCreators},
};
use strata_core::config::Preferences;

fn main() -> anyhow::Result<()> {
    strata::init_logging()?;

    let preferences = Preferences::load();
    // Writes the documented defaults on first run, so there's something to edit.
    if let Err(e) = preferences.save() {
        log::warn!("Failed to save preferences:\n{e:?}");
    }
    let api = strata::canvas_api(&preferences);
    let translations = Translations::load();

    let mut listener = api.store().change_listener();
    let mut creators = LayerCreators::from_api(&api);
    let context = egui::Context::default();
    // Headless pass over the layer panel, until a windowing backend hosts it.
    let _ = context.run(egui::RawInput::default(), |ctx| {
        egui::CentralPanel::default().show(ctx, |ui| {
            let menu = AddLayerMenu::from_api(&api);
            if let Some(item) = add_layer_menu(ui, &menu, &translations, &mut creators) {
                log::info!("Added {item:?}");
            }
        });
    });
    let changes = api.pump(&mut listener);
    log::info!(
        "Canvas ready: {} entities, {changes} pending changes applied",
        api.get_state().identifiers().count()
    );
    Ok(())
}
