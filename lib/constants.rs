//! Constants for mtb-env.
//!
//! This module contains file names, sentinel tokens, environment variable
//! names and default locations used across the crate.

use std::path::PathBuf;
use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Extension of asset descriptor files.
pub const MTB_FILE_EXT: &str = "mtb";

/// Per-directory ignore file.
pub const CYIGNORE_FILE: &str = ".cyignore";

/// Primary tool descriptor file name.
pub const PROPS_FILE: &str = "props.json";

/// Alternate tool descriptor file name.
pub const MTB_PROPS_FILE: &str = "mtbprops.json";

/// Asset version file.
pub const VERSION_XML_FILE: &str = "version.xml";

/// Makefile marker of a BSP.
pub const BSP_MAKEFILE: &str = "bsp.mk";

/// Prefix of every BSP repository and target name.
pub const TARGET_PREFIX: &str = "TARGET_";

/// Prefix of tools directory names (`tools_3.2`).
pub const TOOLS_DIR_PREFIX: &str = "tools_";

/// Application directory holding locally created BSPs.
pub const BSPS_DIR: &str = "bsps";

/// Location token for assets cloned under the project libs directory.
pub const LOCAL_TOKEN: &str = "$$LOCAL$$";

/// Location token for assets cloned into the shared asset repository.
pub const SHARED_TOKEN: &str = "$$ASSET_REPO$$";

/// Location token for assets cloned into the global asset directory.
pub const GLOBAL_TOKEN: &str = "$$GLOBAL$$";

/// Location token for assets at an absolute location.
pub const ABSOLUTE_TOKEN: &str = "$$ABSOLUTE$$";

/// Registry file `type` of a content pack.
pub const CONTENT_PACK_TYPE: &str = "content-pack";

/// Pack type of an early access pack.
pub const EAP_PACK_TYPE: &str = "early-access";

/// Subdirectory of a pack holding its manifests.
pub const PACK_MANIFEST_DIR: &str = "manifest";

/// Super-manifest file name inside a pack manifest directory.
pub const PACK_SUPER_MANIFEST: &str = "mtb-super-manifest-fv2.xml";

/// Subdirectory of a pack holding its tools.
pub const PACK_TOOLS_DIR: &str = "tools";

/// Default remote super-manifest.
pub const DEFAULT_SUPER_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/Infineon/mtb-super-manifest/v2.X/mtb-super-manifest-fv2.xml";

/// Environment variable with space separated candidate tools directories.
pub const CY_TOOLS_PATHS_ENV: &str = "CY_TOOLS_PATHS";

/// Environment variable naming the enabled early access pack.
pub const EARLY_ACCESS_ENV: &str = "MTB_ENABLE_EARLY_ACCESS";

/// Environment variable replacing the default super-manifest URL.
pub const REMOTE_MANIFEST_OVERRIDE_ENV: &str = "CyRemoteManifestOverride";

/// Registry vendor directory.
pub const REGISTRY_VENDOR_DIR: &str = "Infineon_Technologies_AG";

/// Registry product directory.
pub const REGISTRY_PRODUCT_DIR: &str = "Infineon-Toolbox";

/// Repository name of the device database asset.
pub const DEVICE_DB_ASSET: &str = "device-db";

/// Capacity of the environment event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// MPN catalog relative to a device-db root.
pub const MPN_CATALOG_FILE: &str = "mpn/mpn.xml";

/// Default HTTP timeout for manifest downloads, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default per-user ModusToolbox settings directory.
pub static DEFAULT_MTB_HOME_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::home_dir()
        .map(|h| h.join(".modustoolbox"))
        .unwrap_or_else(|| PathBuf::from(".modustoolbox"))
});

/// Default global asset directory.
pub static DEFAULT_GLOBAL_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| DEFAULT_MTB_HOME_PATH.join("global"));

/// File listing extra super-manifest locations, one per line.
pub static MANIFEST_LOC_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| DEFAULT_MTB_HOME_PATH.join("manifest.loc"));

/// Default configuration file for mtb-env.
pub static DEFAULT_CONFIG_FILE: LazyLock<PathBuf> =
    LazyLock::new(|| DEFAULT_MTB_HOME_PATH.join("mtbenv.toml"));
