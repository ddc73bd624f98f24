//! The "add layer" dropdown of the entity list: one button, opening a menu of entity types grouped by purpose.
//!
//! Split into a model ([`AddLayerMenu`]), deciding what's enabled and dispatching clicks to [`LayerCreators`],
//! and an egui view ([`add_layer_menu`]) that only draws it.

use std::sync::Arc;

use strata_core::{
    api::CanvasStateApi,
    policy::EntityTypeEnablement,
    state::entity::{EntityAddOptions, EntityKind},
};

use crate::i18n::Translations;

#[derive(strum::EnumIter, PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum MenuGroup {
    /// Masks that confine an effect to part of the canvas.
    Regional,
    Layer,
}
impl MenuGroup {
    #[must_use]
    pub fn title_key(self) -> &'static str {
        match self {
            Self::Regional => "controlLayers.regional",
            Self::Layer => "controlLayers.layer_other",
        }
    }
}

#[derive(strum::EnumIter, strum::AsRefStr, PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum AddLayerItem {
    InpaintMask,
    RegionalGuidance,
    /// Regional guidance, starting with an empty reference image slot.
    RegionalReferenceImage,
    ControlLayer,
    ControlLayerFromInitialImage,
    RasterLayer,
    RasterLayerFromInitialImage,
}
impl AddLayerItem {
    #[must_use]
    pub fn group(self) -> MenuGroup {
        match self {
            Self::InpaintMask | Self::RegionalGuidance | Self::RegionalReferenceImage => {
                MenuGroup::Regional
            }
            Self::ControlLayer
            | Self::ControlLayerFromInitialImage
            | Self::RasterLayer
            | Self::RasterLayerFromInitialImage => MenuGroup::Layer,
        }
    }
    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            Self::InpaintMask => "controlLayers.inpaintMask",
            Self::RegionalGuidance => "controlLayers.regionalGuidance",
            Self::RegionalReferenceImage => "controlLayers.regionalReferenceImage",
            Self::ControlLayer => "controlLayers.controlLayer",
            Self::ControlLayerFromInitialImage => "controlLayers.newControlLayerFromImage",
            Self::RasterLayer => "controlLayers.rasterLayer",
            Self::RasterLayerFromInitialImage => "controlLayers.newRasterLayerFromImage",
        }
    }
    /// The kind of entity this item creates.
    #[must_use]
    pub fn kind(self) -> EntityKind {
        match self {
            Self::InpaintMask => EntityKind::InpaintMask,
            Self::RegionalGuidance | Self::RegionalReferenceImage => EntityKind::RegionalGuidance,
            Self::ControlLayer | Self::ControlLayerFromInitialImage => EntityKind::ControlLayer,
            Self::RasterLayer | Self::RasterLayerFromInitialImage => EntityKind::RasterLayer,
        }
    }
    /// The model-dependent flag gating this item. Raster layers are never gated.
    #[must_use]
    pub fn type_flag(self, enablement: &EntityTypeEnablement) -> Option<bool> {
        match self {
            Self::InpaintMask => Some(enablement.inpaint_mask),
            Self::RegionalGuidance | Self::RegionalReferenceImage => {
                Some(enablement.regional_guidance)
            }
            Self::ControlLayer | Self::ControlLayerFromInitialImage => {
                Some(enablement.control_layer)
            }
            Self::RasterLayer | Self::RasterLayerFromInitialImage => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct MenuEntry {
    pub item: AddLayerItem,
    pub group: MenuGroup,
    pub label_key: &'static str,
    pub enabled: bool,
}

type Creator = Box<dyn FnMut()>;

/// What each menu item does when clicked.
#[derive(Default)]
pub struct LayerCreators {
    creators: hashbrown::HashMap<AddLayerItem, Creator>,
}
impl LayerCreators {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn with(mut self, item: AddLayerItem, creator: impl FnMut() + 'static) -> Self {
        self.creators.insert(item, Box::new(creator));
        self
    }
    /// Each item adds its entity through the API, and selects it.
    #[must_use]
    pub fn from_api(api: &Arc<CanvasStateApi>) -> Self {
        use strum::IntoEnumIterator;
        AddLayerItem::iter().fold(Self::new(), |this, item| {
            let api = api.clone();
            let kind = item.kind();
            match item {
                AddLayerItem::ControlLayerFromInitialImage
                | AddLayerItem::RasterLayerFromInitialImage => this.with(item, move || {
                    api.add_entity_from_initial_image(kind);
                }),
                _ => {
                    let options = EntityAddOptions {
                        is_selected: true,
                        with_reference_image: item == AddLayerItem::RegionalReferenceImage,
                        ..Default::default()
                    };
                    this.with(item, move || {
                        api.add_entity(kind, options.clone());
                    })
                }
            }
        })
    }
    /// Run the creator for this item. Returns false if there is none.
    fn invoke(&mut self, item: AddLayerItem) -> bool {
        match self.creators.get_mut(&item) {
            Some(creator) => {
                creator();
                true
            }
            None => {
                log::warn!("No creator for {}", item.as_ref());
                false
            }
        }
    }
}

/// Snapshot of everything the menu needs to decide what's clickable.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct AddLayerMenu {
    pub is_busy: bool,
    pub enablement: EntityTypeEnablement,
}
impl AddLayerMenu {
    #[must_use]
    pub fn new(is_busy: bool, enablement: EntityTypeEnablement) -> Self {
        Self {
            is_busy,
            enablement,
        }
    }
    #[must_use]
    pub fn from_api(api: &CanvasStateApi) -> Self {
        Self::new(api.is_busy(), api.entity_type_enablement())
    }
    #[must_use]
    pub fn button_enabled(&self) -> bool {
        !self.is_busy
    }
    #[must_use]
    pub fn is_enabled(&self, item: AddLayerItem) -> bool {
        !self.is_busy && item.type_flag(&self.enablement).unwrap_or(true)
    }
    /// All items, in display order.
    pub fn items(&self) -> impl Iterator<Item = MenuEntry> + '_ {
        use strum::IntoEnumIterator;
        AddLayerItem::iter().map(|item| MenuEntry {
            item,
            group: item.group(),
            label_key: item.label_key(),
            enabled: self.is_enabled(item),
        })
    }
    /// Handle a click. Disabled items do nothing. Returns whether a creator ran.
    pub fn click(&self, item: AddLayerItem, creators: &mut LayerCreators) -> bool {
        if !self.is_enabled(item) {
            return false;
        }
        creators.invoke(item)
    }
}

/// Draw the add layer button and its dropdown. Returns the item that was clicked, if any.
pub fn add_layer_menu(
    ui: &mut egui::Ui,
    menu: &AddLayerMenu,
    translations: &Translations,
    creators: &mut LayerCreators,
) -> Option<AddLayerItem> {
    use strum::IntoEnumIterator;
    let mut clicked = None;
    ui.add_enabled_ui(menu.button_enabled(), |ui| {
        ui.menu_button(super::PLUS_ICON, |ui| {
            for (idx, group) in MenuGroup::iter().enumerate() {
                if idx != 0 {
                    ui.separator();
                }
                ui.label(egui::RichText::new(translations.t(group.title_key())).strong());
                for entry in menu.items().filter(|entry| entry.group == group) {
                    let label = format!("{} {}", super::PLUS_ICON, translations.t(entry.label_key));
                    if ui
                        .add_enabled(entry.enabled, egui::Button::new(label))
                        .clicked()
                    {
                        if menu.click(entry.item, creators) {
                            clicked = Some(entry.item);
                        }
                        ui.close_menu();
                    }
                }
            }
        })
        .response
        .on_hover_text(translations.t("controlLayers.addLayer"));
    });
    clicked
}
