use crate::cidr::AddressBlock;
use crate::name::EnvName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

pub const DEFAULT_NAME_PREFIX: &str = "Infrabox";
pub const DEFAULT_LOCATION: &str = "westeurope";
pub const DEFAULT_ADMIN_USERNAME: &str = "azureuser";
pub const DEFAULT_SSH_PUBLIC_KEY_PATH: &str = "~/.ssh/id_rsa_infrabox.pub";
pub const DEFAULT_NETWORK: AddressBlock = AddressBlock::from_raw(Ipv4Addr::new(10, 0, 0, 0), 16);
pub const DEFAULT_SUBNET: AddressBlock = AddressBlock::from_raw(Ipv4Addr::new(10, 0, 1, 0), 24);

/// The full parameter set rendered into an environment's configuration.
///
/// Field names are the template context keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvParams {
    pub name_prefix: String,
    pub environment: EnvName,
    pub location: String,
    pub dns_zone_name: String,
    pub admin_username: String,
    pub ssh_public_key_path: String,
    pub vnet_address_space: AddressBlock,
    pub subnet_address_space: AddressBlock,
}

impl EnvParams {
    /// Every parameter at its default for `environment`.
    pub fn from_defaults(environment: &EnvName, defaults: &ParamDefaults) -> Self {
        Self {
            name_prefix: defaults.name_prefix.clone(),
            environment: environment.clone(),
            location: defaults.location.clone(),
            dns_zone_name: dns_zone_default(&defaults.name_prefix, environment),
            admin_username: defaults.admin_username.clone(),
            ssh_public_key_path: defaults.ssh_public_key_path.clone(),
            vnet_address_space: defaults.network_cidr,
            subnet_address_space: defaults.subnet_cidr,
        }
    }

    /// Flat key/value context handed to the template renderer.
    pub fn context(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("name_prefix", self.name_prefix.clone()),
            ("environment", self.environment.to_string()),
            ("location", self.location.clone()),
            ("dns_zone_name", self.dns_zone_name.clone()),
            ("admin_username", self.admin_username.clone()),
            ("ssh_public_key_path", self.ssh_public_key_path.clone()),
            ("vnet_address_space", self.vnet_address_space.to_string()),
            ("subnet_address_space", self.subnet_address_space.to_string()),
        ])
    }
}

/// Defaults offered at each prompt. Overridable from the `[defaults]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamDefaults {
    pub name_prefix: String,
    pub location: String,
    pub admin_username: String,
    pub ssh_public_key_path: String,
    pub network_cidr: AddressBlock,
    pub subnet_cidr: AddressBlock,
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self {
            name_prefix: DEFAULT_NAME_PREFIX.to_owned(),
            location: DEFAULT_LOCATION.to_owned(),
            admin_username: DEFAULT_ADMIN_USERNAME.to_owned(),
            ssh_public_key_path: DEFAULT_SSH_PUBLIC_KEY_PATH.to_owned(),
            network_cidr: DEFAULT_NETWORK,
            subnet_cidr: DEFAULT_SUBNET,
        }
    }
}

/// Default DNS zone: `<prefix>-<environment>.com`.
pub fn dns_zone_default(name_prefix: &str, environment: &EnvName) -> String {
    format!("{name_prefix}-{environment}.com")
}

/// A parameter collected interactively during `initialize`, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    NamePrefix,
    Location,
    DnsZoneName,
    AdminUsername,
    SshPublicKeyPath,
    NetworkCidr,
    SubnetCidr,
}

impl ParamField {
    pub const ALL: [ParamField; 7] = [
        ParamField::NamePrefix,
        ParamField::Location,
        ParamField::DnsZoneName,
        ParamField::AdminUsername,
        ParamField::SshPublicKeyPath,
        ParamField::NetworkCidr,
        ParamField::SubnetCidr,
    ];

    pub fn prompt(self) -> &'static str {
        match self {
            ParamField::NamePrefix => "Enter name prefix",
            ParamField::Location => "Enter Azure location",
            ParamField::DnsZoneName => "Enter DNS zone name",
            ParamField::AdminUsername => "Enter admin username",
            ParamField::SshPublicKeyPath => "Enter path to SSH public key",
            ParamField::NetworkCidr => "Enter VNet CIDR",
            ParamField::SubnetCidr => "Enter Subnet CIDR",
        }
    }

    /// The default shown for this field. The DNS zone default depends on the
    /// name prefix chosen earlier in the same session.
    pub fn default_value(self, defaults: &ParamDefaults, name_prefix: &str, env: &EnvName) -> String {
        match self {
            ParamField::NamePrefix => defaults.name_prefix.clone(),
            ParamField::Location => defaults.location.clone(),
            ParamField::DnsZoneName => dns_zone_default(name_prefix, env),
            ParamField::AdminUsername => defaults.admin_username.clone(),
            ParamField::SshPublicKeyPath => defaults.ssh_public_key_path.clone(),
            ParamField::NetworkCidr => defaults.network_cidr.to_string(),
            ParamField::SubnetCidr => defaults.subnet_cidr.to_string(),
        }
    }

    /// Strip characters the field can never legitimately contain.
    ///
    /// Identifiers keep `[A-Za-z0-9_-]`, DNS zones additionally keep `.`;
    /// paths and address blocks are only trimmed (they are validated later).
    pub fn sanitize(self, input: &str) -> String {
        let trimmed = input.trim();
        match self {
            ParamField::NamePrefix | ParamField::Location | ParamField::AdminUsername => trimmed
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect(),
            ParamField::DnsZoneName => trimmed
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
                .collect(),
            ParamField::SshPublicKeyPath | ParamField::NetworkCidr | ParamField::SubnetCidr => {
                trimmed.to_owned()
            }
        }
    }
}
