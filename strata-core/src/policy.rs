use crate::state::params::BaseModel;

/// Which entity types the selected model can make use of.
/// Raster layers and inpaint masks work with every model, and so have no flag.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EntityTypeEnablement {
    pub regional_guidance: bool,
    pub control_layer: bool,
    pub inpaint_mask: bool,
    pub reference_image: bool,
}
impl Default for EntityTypeEnablement {
    fn default() -> Self {
        Self::for_model(None)
    }
}
impl EntityTypeEnablement {
    /// With no model selected, everything is allowed.
    #[must_use]
    pub fn for_model(base_model: Option<BaseModel>) -> Self {
        let is_sd3 = base_model == Some(BaseModel::StableDiffusion3);
        let is_flux = base_model == Some(BaseModel::Flux);
        Self {
            regional_guidance: !is_sd3 && !is_flux,
            control_layer: !is_sd3,
            inpaint_mask: true,
            reference_image: !is_sd3,
        }
    }
}
