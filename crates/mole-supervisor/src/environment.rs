use crate::{SupervisorConfig, TemplateLocator};

pub const ENV_SERVER_PORT: &str = "MOLE_PORT";
pub const ENV_SERVER_HOST: &str = "MOLE_HOST";
pub const ENV_SERVER_NO_OPEN: &str = "MOLE_NO_OPEN";
pub const ENV_SERVER_TEMPLATES: &str = "MOLE_TEMPLATES";

/// Variables laid over the inherited environment of the server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEnvironment {
    vars: Vec<(&'static str, String)>,
}

impl ServerEnvironment {
    pub fn from_config(config: &SupervisorConfig) -> Self {
        let mut vars = vec![
            (ENV_SERVER_PORT, config.server.port.to_string()),
            (ENV_SERVER_HOST, config.server.host.clone()),
        ];

        if config.server.suppress_browser {
            vars.push((ENV_SERVER_NO_OPEN, "1".into()));
        }

        if let Some(ref templates) = config.server.templates_dir {
            vars.push((ENV_SERVER_TEMPLATES, templates.display().to_string()));
        }

        Self { vars }
    }

    /// Overlay for a launch: config's templates dir, else whatever `templates` finds.
    pub fn resolve(config: &SupervisorConfig, templates: &TemplateLocator) -> Self {
        let mut environment = Self::from_config(config);

        if config.server.templates_dir.is_none()
            && let Some(dir) = templates.resolve()
        {
            environment
                .vars
                .push((ENV_SERVER_TEMPLATES, dir.display().to_string()));
        }

        environment
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.vars.iter().map(|(k, v)| (*k, v.as_str()))
    }
}
