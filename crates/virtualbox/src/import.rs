//! Appliance import.

use std::path::Path;

use log::info;

use crate::command::{Invocation, VBoxCommand};
use crate::error::VBoxResult;

/// Build the invocation importing virtual system `vsys` of the OVA/OVF at
/// `path` as a machine called `name`.
pub fn import_ovf_invocation(path: &Path, vsys: u32, name: &str) -> Invocation {
    Invocation::new([
        "import".to_string(),
        path.to_string_lossy().into_owned(),
        "--vsys".to_string(),
        vsys.to_string(),
        "--vmname".to_string(),
        name.to_string(),
    ])
}

/// Import an OVA or OVF appliance through the host-side tool.
pub fn import_ovf(
    manage: &dyn VBoxCommand,
    path: impl AsRef<Path>,
    vsys: u32,
    name: &str,
) -> VBoxResult<()> {
    let path = path.as_ref();
    info!("Importing {} (vsys {}) as '{}'", path.display(), vsys, name);
    manage.run(import_ovf_invocation(path, vsys, name))
}
