//! Registry listing

use emv_common::TagRegistry;

use super::parse_hex;
use crate::error::CliError;

pub fn cmd_tags(rid: Option<&str>) -> Result<(), CliError> {
    let registry = TagRegistry::global();
    let tags = match rid {
        Some(rid) => {
            let rid = parse_hex("RID", rid)?;
            println!("Payment system {}:\n", hex::encode_upper(&rid));
            registry.payment_system_tags(&rid)
        }
        None => {
            println!("Global scope:\n");
            registry.global_tags()
        }
    };

    if tags.is_empty() {
        println!("No tags registered");
        let known: Vec<_> = registry.payment_systems().map(hex::encode_upper).collect();
        println!("Known payment systems: {}", known.join(", "));
        return Ok(());
    }

    for tag in tags {
        println!("[{}] {} ({})", tag.id_hex(), tag.name, tag.kind);
        if !tag.description.is_empty() {
            println!("    {}", tag.description);
        }
    }
    Ok(())
}
