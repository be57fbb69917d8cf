use crate::api::LoadAdapter;
use crate::load::{load_via_config_list, NpmMeta};

/// Metadata probe for npm >= 8: one `npm config list --json` call.
pub struct ModernLoad;

impl LoadAdapter for ModernLoad {
    fn load(&self) -> Result<NpmMeta, String> {
        load_via_config_list()
    }
}
