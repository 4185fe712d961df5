use super::{json_pretty, report_error, EXIT_SUCCESS};
use infrabox_core::Engine;

pub fn run(engine: &Engine, environment: &str, json: bool) -> Result<u8, String> {
    let details = match engine.inspect(environment) {
        Ok(details) => details,
        Err(e) => return report_error(&e, "inspect", environment),
    };
    if json {
        println!("{}", json_pretty(&details)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("name:        {}", details.name);
    println!("path:        {}", details.path.display());
    println!("state:       {}", details.state);
    match &details.record {
        Some(record) => {
            let p = &record.params;
            println!("created_at:  {}", record.created_at);
            println!("prefix:      {}", p.name_prefix);
            println!("location:    {}", p.location);
            println!("dns_zone:    {}", p.dns_zone_name);
            println!("admin:       {}", p.admin_username);
            println!("ssh_key:     {}", p.ssh_public_key_path);
            println!("network:     {}", p.vnet_address_space);
            println!("subnet:      {}", p.subnet_address_space);
        }
        None => {
            println!("record:      (none)");
            if let Some(decl) = &details.declaration {
                let blocks: Vec<String> = decl.blocks().map(ToString::to_string).collect();
                println!("blocks:      {}", blocks.join(", "));
            }
        }
    }
    println!("files:       {}", details.files.join(", "));
    Ok(EXIT_SUCCESS)
}
