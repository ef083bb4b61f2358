use crate::field::FieldSpec;
use crate::resource::ResourceSchema;

/// `gateway.solo.io/v1` `RouteOption`
pub fn route_option() -> ResourceSchema {
    ResourceSchema::new("gateway.solo.io", "v1", "RouteOption")
        .with_plural("routeoptions")
        .with_description("Route-level options attached to Kubernetes Gateway API routes.")
        .with_spec(vec![
            FieldSpec::string("hostRewrite")
                .min_length(1)
                .describe("Rewrite the Host header to this value before forwarding."),
            FieldSpec::string("prefixRewrite")
                .describe("Replace the matched path prefix with this value."),
            FieldSpec::string("timeout").describe("Upstream request timeout, e.g. '15s'."),
            retries(),
            header_manipulation(),
            cors(),
            FieldSpec::list("targetRefs", policy_target_reference())
                .describe("Routes these options apply to."),
        ])
}

fn retries() -> FieldSpec {
    FieldSpec::object(
        "retries",
        vec![
            FieldSpec::string("retryOn")
                .describe("Conditions that trigger a retry, e.g. '5xx,connect-failure'."),
            FieldSpec::integer("numRetries")
                .between(0, i64::from(u32::MAX))
                .describe("Maximum number of retries."),
            FieldSpec::string("perTryTimeout").describe("Timeout for each attempt."),
        ],
    )
    .describe("Retry policy for the route.")
}

fn header_value_option() -> FieldSpec {
    FieldSpec::object(
        "item",
        vec![
            FieldSpec::object(
                "header",
                vec![
                    FieldSpec::string("key").min_length(1),
                    FieldSpec::string("value"),
                ],
            ),
            FieldSpec::boolean("append")
                .describe("Append to existing values instead of replacing them."),
        ],
    )
}

fn header_manipulation() -> FieldSpec {
    FieldSpec::object(
        "headerManipulation",
        vec![
            FieldSpec::list("requestHeadersToAdd", header_value_option()),
            FieldSpec::list("requestHeadersToRemove", FieldSpec::string("item")),
            FieldSpec::list("responseHeadersToAdd", header_value_option()),
            FieldSpec::list("responseHeadersToRemove", FieldSpec::string("item")),
        ],
    )
}

fn cors() -> FieldSpec {
    FieldSpec::object(
        "cors",
        vec![
            FieldSpec::list("allowOrigin", FieldSpec::string("item")),
            FieldSpec::list("allowOriginRegex", FieldSpec::string("item")),
            FieldSpec::list("allowMethods", FieldSpec::string("item")),
            FieldSpec::list("allowHeaders", FieldSpec::string("item")),
            FieldSpec::list("exposeHeaders", FieldSpec::string("item")),
            FieldSpec::string("maxAge"),
            FieldSpec::boolean("allowCredentials"),
        ],
    )
    .describe("Cross-origin resource sharing policy.")
}

fn policy_target_reference() -> FieldSpec {
    FieldSpec::object(
        "item",
        vec![
            FieldSpec::string("group").max_length(253),
            FieldSpec::string("kind").min_length(1).max_length(63),
            FieldSpec::string("name").min_length(1).max_length(253),
            FieldSpec::string("namespace").max_length(63),
        ],
    )
}
