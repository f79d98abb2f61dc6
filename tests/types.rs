// ABOUTME: Integration tests for type-safe identifiers and validated types.
// ABOUTME: Tests image refs, slot names, aliases and runtime ids.

use testbed::types::*;

mod image_ref_tests {
    use super::*;

    #[test]
    fn bare_name_defaults_to_latest() {
        let img = ImageRef::parse("postgres").unwrap();
        assert_eq!(img.name(), "postgres");
        assert_eq!(img.tag(), Some("latest"));
        assert_eq!(img.registry(), None);
        assert_eq!(img.to_string(), "postgres:latest");
    }

    #[test]
    fn hub_namespace_is_not_a_registry() {
        let img = ImageRef::parse("atmoz/sftp:alpine").unwrap();
        assert_eq!(img.registry(), None);
        assert_eq!(img.name(), "atmoz/sftp");
        assert_eq!(img.tag(), Some("alpine"));
    }

    #[test]
    fn dotted_first_component_is_a_registry() {
        let img = ImageRef::parse("quay.io/minio/minio:RELEASE.2024-01-01").unwrap();
        assert_eq!(img.registry(), Some("quay.io"));
        assert_eq!(img.name(), "minio/minio");
        assert_eq!(img.tag(), Some("RELEASE.2024-01-01"));
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        let img = ImageRef::parse("localhost:5000/app").unwrap();
        assert_eq!(img.registry(), Some("localhost:5000"));
        assert_eq!(img.name(), "app");
        assert_eq!(img.tag(), Some("latest"));
    }

    #[test]
    fn digest_only_reference_has_no_tag() {
        let img = ImageRef::parse("redis@sha256:0123abcd").unwrap();
        assert_eq!(img.digest(), Some("sha256:0123abcd"));
        assert_eq!(img.tag(), None);
        assert_eq!(img.to_string(), "redis@sha256:0123abcd");
    }

    #[test]
    fn tag_and_digest_round_trip_through_display() {
        let text = "ghcr.io/acme/api:1.4@sha256:feed";
        assert_eq!(ImageRef::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            ImageRef::parse("  nginx:1.27  ").unwrap(),
            ImageRef::parse("nginx:1.27").unwrap()
        );
    }

    #[test]
    fn malformed_references_are_rejected() {
        assert_eq!(ImageRef::parse(""), Err(ParseImageRefError::Empty));
        assert_eq!(
            ImageRef::parse("nginx latest"),
            Err(ParseImageRefError::InvalidChar(' '))
        );
        assert_eq!(
            ImageRef::parse("nginx:"),
            Err(ParseImageRefError::EmptyComponent("tag"))
        );
        assert_eq!(
            ImageRef::parse("nginx@"),
            Err(ParseImageRefError::EmptyComponent("digest"))
        );
    }

    #[test]
    fn local_build_tag() {
        let img = ImageRef::local("testbed/ci-app", "latest");
        assert_eq!(img.to_string(), "testbed/ci-app:latest");
    }

    #[test]
    fn serializes_as_reference_string() {
        let img = ImageRef::parse("nginx:1.27").unwrap();
        assert_eq!(serde_json::to_string(&img).unwrap(), "\"nginx:1.27\"");
    }
}

mod network_alias_tests {
    use super::*;

    #[test]
    fn accepts_dns_style_names() {
        for alias in ["db", "api-v2", "cache_1", "svc.internal"] {
            assert_eq!(NetworkAlias::new(alias).unwrap().as_str(), alias);
        }
    }

    #[test]
    fn trims_whitespace() {
        assert_eq!(NetworkAlias::new(" db ").unwrap().as_str(), "db");
    }

    #[test]
    fn blank_alias_is_empty() {
        assert_eq!(NetworkAlias::new("  "), Err(NetworkAliasError::Empty));
    }

    #[test]
    fn reports_first_bad_character() {
        assert_eq!(
            NetworkAlias::new("db/primary"),
            Err(NetworkAliasError::InvalidChar('/'))
        );
    }
}

mod slot_name_tests {
    use super::*;

    #[test]
    fn valid_dns_name() {
        let name = SlotName::new("my-service").unwrap();
        assert_eq!(name.as_str(), "my-service");
    }

    #[test]
    fn empty_returns_error() {
        assert_eq!(SlotName::new(""), Err(SlotNameError::Empty));
    }

    #[test]
    fn too_long_returns_error() {
        let long_name = "a".repeat(64);
        assert_eq!(SlotName::new(&long_name), Err(SlotNameError::TooLong));
    }

    #[test]
    fn starts_with_hyphen_returns_error() {
        assert_eq!(SlotName::new("-service"), Err(SlotNameError::BadEdge));
    }

    #[test]
    fn ends_with_hyphen_returns_error() {
        assert_eq!(SlotName::new("service-"), Err(SlotNameError::BadEdge));
    }

    #[test]
    fn uppercase_returns_error() {
        assert_eq!(SlotName::new("MyService"), Err(SlotNameError::InvalidChar('M')));
    }

    #[test]
    fn valid_63_chars() {
        let name = "a".repeat(63);
        assert!(SlotName::new(&name).is_ok());
    }

    #[test]
    fn slot_name_doubles_as_alias() {
        let name = SlotName::new("db").unwrap();
        assert_eq!(name.as_alias().as_str(), "db");
    }
}

mod id_tests {
    use super::*;

    #[test]
    fn container_id_stores_value() {
        let id = ContainerId::new("abc123".to_string());
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn network_id_stores_value() {
        let id = NetworkId::new("net456".to_string());
        assert_eq!(id.as_str(), "net456");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ContainerId::new("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
    }

    #[test]
    fn instance_id_displays_as_uuid() {
        let id = InstanceId::generate();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert!(text.replace('-', "").starts_with(&id.short()));
    }
}
