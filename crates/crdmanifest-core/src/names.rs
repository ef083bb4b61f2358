//! Kubernetes name and key syntax, as anchored regex patterns

use crate::field::Constraints;

pub const RFC_1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";

// This is a subdomain's max length in DNS (RFC 1123)
pub const RFC_1123_SUBDOMAIN_MAX_LENGTH: u64 = 253;
// Minimal length required by RFC 1123 is 63. Up to 255 allowed, unsupported by k8s.
pub const RFC_1123_LABEL_MAX_LENGTH: u64 = 63;

pub const LABEL_VALUE_MAX_LENGTH: u64 = 63;
// prefix (subdomain) + '/' + name (63)
pub const QUALIFIED_KEY_MAX_LENGTH: u64 = RFC_1123_SUBDOMAIN_MAX_LENGTH + 1 + 63;

const QUALIFIED_NAME_FMT: &str = "[A-Za-z0-9]([-A-Za-z0-9_.]{0,61}[A-Za-z0-9])?";

fn rfc_1123_subdomain_fmt() -> String {
    format!("{0}(\\.{0})*", RFC_1123_LABEL_FMT)
}

/// `metadata.name`
pub fn rfc_1123_subdomain_pattern() -> String {
    format!("^{}$", rfc_1123_subdomain_fmt())
}

/// `metadata.namespace`
pub fn rfc_1123_label_pattern() -> String {
    format!("^{}$", RFC_1123_LABEL_FMT)
}

/// Label and annotation keys: optional DNS subdomain prefix, then a name
pub fn qualified_key_pattern() -> String {
    format!("^({}/)?{}$", rfc_1123_subdomain_fmt(), QUALIFIED_NAME_FMT)
}

/// Label values may be empty
pub fn label_value_pattern() -> String {
    format!("^({})?$", QUALIFIED_NAME_FMT)
}

pub fn qualified_key_constraints() -> Constraints {
    Constraints {
        min_length: Some(1),
        max_length: Some(QUALIFIED_KEY_MAX_LENGTH),
        pattern: Some(qualified_key_pattern()),
        ..Default::default()
    }
}
