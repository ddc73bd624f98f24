pub mod add_layer_menu;

pub use add_layer_menu::{add_layer_menu, AddLayerItem, AddLayerMenu, LayerCreators, MenuGroup};

const PLUS_ICON: &str = "➕";
