// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a starter testbed.yml describing a small environment.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, EnvironmentConfig};

pub fn init_config(dir: &Path, environment: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(environment.unwrap_or("integration"));
    // Never write a file the loader would reject.
    EnvironmentConfig::from_yaml(&yaml)?;
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(environment: &str) -> String {
    format!(
        r#"environment: {environment}
slots:
  - name: db
    fragments:
      - image: postgres:16-alpine
      - env:
          key: POSTGRES_PASSWORD
          value: testbed
      - port:
          scheme: tcp
          container_port: 5432
      - health_check:
          test: [pg_isready, -U, postgres]
  - name: web
    capability: http
    fragments:
      - image: nginx:1.27-alpine
      - port:
          scheme: http
          container_port: 80
provision:
  timeout: 2m
  # poll_interval: 500ms
  # public_host: localhost
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_parses() {
        let config = EnvironmentConfig::from_yaml(&generate_template_yaml("ci")).unwrap();
        assert_eq!(config.environment, "ci");
        assert_eq!(config.slots.len(), 2);
    }
}
