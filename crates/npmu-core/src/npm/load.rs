use crate::api::LoadAdapter;
use crate::load::{load_via_config_get, NpmMeta};

/// Metadata probe for npm < 8: one `npm config get` per key.
pub struct LegacyLoad;

impl LoadAdapter for LegacyLoad {
    fn load(&self) -> Result<NpmMeta, String> {
        load_via_config_get()
    }
}
