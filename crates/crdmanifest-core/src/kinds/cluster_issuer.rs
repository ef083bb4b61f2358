use crate::field::FieldSpec;
use crate::resource::{ResourceSchema, Scope};

/// `cert-manager.io/v1` `ClusterIssuer`, a cluster-scoped kind
pub fn cluster_issuer() -> ResourceSchema {
    ResourceSchema::new("cert-manager.io", "v1", "ClusterIssuer")
        .with_plural("clusterissuers")
        .with_scope(Scope::Cluster)
        .with_description("A certificate authority able to sign certificates in any namespace.")
        .with_spec(vec![acme(), ca(), self_signed()])
}

fn secret_key_selector(name: &str) -> FieldSpec {
    FieldSpec::object(
        name,
        vec![
            FieldSpec::string("name").min_length(1),
            FieldSpec::string("key"),
        ],
    )
}

fn acme() -> FieldSpec {
    FieldSpec::object(
        "acme",
        vec![
            FieldSpec::string("server")
                .min_length(1)
                .describe("ACME directory URL."),
            FieldSpec::string("email").describe("Email address used for ACME registration."),
            secret_key_selector("privateKeySecretRef"),
            FieldSpec::boolean("skipTLSVerify"),
            FieldSpec::list(
                "solvers",
                FieldSpec::object(
                    "item",
                    vec![
                        FieldSpec::object(
                            "http01",
                            vec![FieldSpec::object(
                                "ingress",
                                vec![
                                    FieldSpec::string("class"),
                                    FieldSpec::string("ingressClassName"),
                                ],
                            )],
                        ),
                        FieldSpec::object(
                            "selector",
                            vec![
                                FieldSpec::list("dnsNames", FieldSpec::string("item")),
                                FieldSpec::list("dnsZones", FieldSpec::string("item")),
                                FieldSpec::map("matchLabels"),
                            ],
                        ),
                    ],
                ),
            ),
        ],
    )
}

fn ca() -> FieldSpec {
    FieldSpec::object(
        "ca",
        vec![
            FieldSpec::string("secretName")
                .min_length(1)
                .describe("Secret holding the signing key pair."),
            FieldSpec::list("crlDistributionPoints", FieldSpec::string("item")),
        ],
    )
}

fn self_signed() -> FieldSpec {
    FieldSpec::object(
        "selfSigned",
        vec![FieldSpec::list(
            "crlDistributionPoints",
            FieldSpec::string("item"),
        )],
    )
}
