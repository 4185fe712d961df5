//! Value types shared by every infrabox crate.
//!
//! This crate defines the schema layer: sanitized environment names (`EnvName`),
//! strict IPv4 address blocks (`AddressBlock`), the parameter set rendered into
//! each environment (`EnvParams`, `ParamDefaults`, `ParamField`), the generated
//! artifacts (`Artifact`), and the structured sidecar record (`EnvRecord`) that
//! peers read back for overlap checks.

pub mod artifact;
pub mod cidr;
pub mod name;
pub mod params;
pub mod record;

pub use artifact::Artifact;
pub use cidr::{validate_cidr, AddressBlock, CidrError};
pub use name::{EnvName, NameError, KNOWN_ENVIRONMENTS};
pub use params::{dns_zone_default, EnvParams, ParamDefaults, ParamField};
pub use record::{parse_record_file, parse_record_str, EnvRecord, RecordError, RECORD_FORMAT_VERSION};
