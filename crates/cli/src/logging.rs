use engine_config::{defaults, env::EnvManager, settings::ENV_LOG_LEVEL};
use tracing::warn;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// Global subscriber whose level can be raised or lowered once the full
/// settings are known.
pub struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    pinned: bool,
}

impl Logging {
    /// Installs the subscriber before any settings are read. `RUST_LOG`
    /// pins the filter for the whole run.
    pub fn init(env: &EnvManager, json: bool) -> Self {
        let (filter, pinned) = match EnvFilter::try_from_default_env() {
            Ok(filter) => (filter, true),
            Err(_) => (EnvFilter::new(startup_level(env)), false),
        };
        let (filter, handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter)
            .with(json.then(|| fmt::layer().json()))
            .with((!json).then(fmt::layer))
            .init();

        Self { handle, pinned }
    }

    /// Switches to the configured level unless `RUST_LOG` pinned one.
    pub fn apply_level(&self, level: &str) {
        if self.pinned {
            return;
        }
        if let Err(e) = self.handle.reload(EnvFilter::new(level)) {
            warn!(error = %e, level, "Could not apply configured log level");
        }
    }
}

/// Level in effect while the config file is being read.
fn startup_level(env: &EnvManager) -> &str {
    env.get(ENV_LOG_LEVEL).unwrap_or(defaults::LOG_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_level_comes_from_env_then_default() {
        let env = EnvManager::from_vars([(ENV_LOG_LEVEL, "debug")]);
        assert_eq!(startup_level(&env), "debug");

        let env = EnvManager::from_vars(Vec::<(String, String)>::new());
        assert_eq!(startup_level(&env), defaults::LOG_LEVEL);
    }
}
