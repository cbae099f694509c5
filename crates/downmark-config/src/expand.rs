//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Bare `$VAR` is left as written. `field` names the setting in errors.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let expanded = shellexpand::env_with_context(value, lookup).map_err(|err| {
        let UnsetVar(name) = err.cause;
        ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{name}}} not set"),
        }
    })?;
    Ok(expanded.into_owned())
}

/// Variable without a value and without a `:-` default.
struct UnsetVar(String);

fn lookup(name: &str) -> Result<Option<String>, UnsetVar> {
    std::env::var(name)
        .map(Some)
        .map_err(|_| UnsetVar(name.to_owned()))
}
