//! Terminal configuration loading

use std::path::Path;

use emv_card::TerminalContext;
use emv_card::terminal::{TerminalConfig, locale_currency};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use tracing::debug;

use crate::error::CliError;

/// Load the terminal configuration
///
/// Built-in defaults, then the TOML file when given, then `EMV_` environment
/// variables (`EMV_COUNTRY_CODE=826`).
pub fn load_config(path: Option<&Path>) -> Result<TerminalConfig, CliError> {
    let mut figment = Figment::from(Serialized::defaults(TerminalConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    Ok(figment.merge(Env::prefixed("EMV_")).extract().map_err(Box::new)?)
}

/// Terminal context for a session, with the host locale's currency
pub fn terminal_context(path: Option<&Path>) -> Result<TerminalContext, CliError> {
    let config = load_config(path)?;
    let currency = locale_currency();
    debug!(?config, ?currency, "Loaded terminal configuration");
    Ok(TerminalContext::from_config(&config)?.with_locale_currency(currency))
}
