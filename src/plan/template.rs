// ABOUTME: Environment variable snapshot and `${VAR}` template rendering.
// ABOUTME: The snapshot is captured once so resolution never reads the live environment.

use std::collections::BTreeMap;

/// A frozen view of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Snapshot the current process environment.
    pub fn capture() -> Self {
        std::env::vars().collect()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Replace every `${NAME}` with its value; unknown names render as
    /// the empty string. An unterminated `${` is kept literally.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find('}') {
                Some(end) => {
                    out.push_str(self.get(&after[..end]).unwrap_or_default());
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn renders_known_variables() {
        let env: EnvSnapshot = [("USER", "ci"), ("RUN", "42")].into_iter().collect();
        assert_eq!(env.render("db-${USER}-${RUN}"), "db-ci-42");
    }

    #[test]
    fn unknown_variables_render_empty() {
        let env = EnvSnapshot::empty();
        assert_eq!(env.render("db-${MISSING}"), "db-");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let env: EnvSnapshot = [("A", "x")].into_iter().collect();
        assert_eq!(env.render("${A}-${B"), "x-${B");
    }

    #[test]
    fn capture_reads_process_environment() {
        temp_env::with_var("TESTBED_TEMPLATE_SAMPLE", Some("sample"), || {
            let env = EnvSnapshot::capture();
            assert_eq!(env.get("TESTBED_TEMPLATE_SAMPLE"), Some("sample"));
            assert_eq!(env.render("${TESTBED_TEMPLATE_SAMPLE}"), "sample");
        });
    }

    proptest! {
        #[test]
        fn text_without_placeholders_is_unchanged(s in "[^$]*") {
            let env: EnvSnapshot = [("X", "y")].into_iter().collect();
            prop_assert_eq!(env.render(&s), s);
        }

        #[test]
        fn placeholder_renders_to_value(
            name in "[A-Z_][A-Z0-9_]{0,12}",
            value in "[a-z0-9-]{0,16}",
            prefix in "[a-z-]{0,8}",
        ) {
            let env: EnvSnapshot = [(name.clone(), value.clone())].into_iter().collect();
            let rendered = env.render(&format!("{prefix}${{{name}}}"));
            prop_assert_eq!(rendered, format!("{prefix}{value}"));
        }
    }
}
