use crate::config::helpers::parse_optional_env;
use crate::error::ConfigError;
use crate::session::BusyPolicy;

/// Session handling settings.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub busy_policy: BusyPolicy,
}

impl SessionConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        Ok(Self {
            busy_policy: parse_optional_env("BUSY_POLICY", BusyPolicy::default())?,
        })
    }
}
