use crate::prompt::Prompter;
use crate::CoreError;
use infrabox_schema::{AddressBlock, EnvName, EnvParams, ParamDefaults, ParamField};
use tracing::debug;

/// Values supplied up front; a field with an override is not prompted for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamOverrides {
    pub name_prefix: Option<String>,
    pub location: Option<String>,
    pub dns_zone_name: Option<String>,
    pub admin_username: Option<String>,
    pub ssh_public_key_path: Option<String>,
    pub network_cidr: Option<String>,
    pub subnet_cidr: Option<String>,
}

impl ParamOverrides {
    pub fn get(&self, field: ParamField) -> Option<&str> {
        match field {
            ParamField::NamePrefix => self.name_prefix.as_deref(),
            ParamField::Location => self.location.as_deref(),
            ParamField::DnsZoneName => self.dns_zone_name.as_deref(),
            ParamField::AdminUsername => self.admin_username.as_deref(),
            ParamField::SshPublicKeyPath => self.ssh_public_key_path.as_deref(),
            ParamField::NetworkCidr => self.network_cidr.as_deref(),
            ParamField::SubnetCidr => self.subnet_cidr.as_deref(),
        }
    }
}

fn parse_block(field: &'static str, value: &str) -> Result<AddressBlock, CoreError> {
    AddressBlock::parse(value).map_err(|source| CoreError::Cidr { field, source })
}

/// Gather every parameter for `env`, in prompt order.
///
/// Each answer is sanitized for its field; an answer that sanitizes to
/// nothing falls back to the default. Both address blocks must parse.
/// Whether the subnet lies inside the network is left to
/// [`check_containment`], which the engine runs after the overlap guard.
pub fn collect_params(
    env: &EnvName,
    defaults: &ParamDefaults,
    overrides: &ParamOverrides,
    prompter: &dyn Prompter,
) -> Result<EnvParams, CoreError> {
    let mut params = EnvParams::from_defaults(env, defaults);
    let mut network = String::new();
    let mut subnet = String::new();

    for field in ParamField::ALL {
        let default = field.default_value(defaults, &params.name_prefix, env);
        let raw = match overrides.get(field) {
            Some(value) => value.to_owned(),
            None => prompter.input(field.prompt(), &default)?,
        };
        let mut value = field.sanitize(&raw);
        if value.is_empty() {
            value = default;
        }
        debug!("{field:?} = {value}");

        match field {
            ParamField::NamePrefix => params.name_prefix = value,
            ParamField::Location => params.location = value,
            ParamField::DnsZoneName => params.dns_zone_name = value,
            ParamField::AdminUsername => params.admin_username = value,
            ParamField::SshPublicKeyPath => params.ssh_public_key_path = value,
            ParamField::NetworkCidr => network = value,
            ParamField::SubnetCidr => subnet = value,
        }
    }

    params.vnet_address_space = parse_block("network address block", &network)?;
    params.subnet_address_space = parse_block("subnet address block", &subnet)?;
    Ok(params)
}

/// The subnet must lie inside the environment's own network.
pub fn check_containment(params: &EnvParams) -> Result<(), CoreError> {
    if params
        .vnet_address_space
        .contains(&params.subnet_address_space)
    {
        Ok(())
    } else {
        Err(CoreError::SubnetOutsideNetwork {
            subnet: params.subnet_address_space.to_string(),
            network: params.vnet_address_space.to_string(),
        })
    }
}
