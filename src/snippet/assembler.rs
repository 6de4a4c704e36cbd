//! Packages compiled backends and the routing table into the five artifacts.

use crate::compiler::backend::{Backend, MAX_CONNECTIONS};
use crate::compiler::cache_key::{CacheDecision, HashTerm};
use crate::compiler::path_pattern::RouteMatch;
use crate::compiler::routing::{RouteRule, RoutingTable};
use crate::snippet::vcl::{
    Action, BackendDecl, Case, CaseLabel, Cond, Expr, Fragment, PropValue, Property, Stmt,
    Subroutine,
};
use crate::snippet::SnippetSet;

/// Custom subroutine that selects the backend and sets cache signals.
pub const ROUTE_SUB: &str = "parse_and_route";

const HASH: &str = "req.http.hash";
const IS_PASS: &str = "req.http.is_pass";
const NEW_TTL: &str = "req.http.new_ttl";
const BACKEND_VAR: &str = "var.backend";

/// Build the full artifact set.
pub fn assemble(backends: &[Backend], table: &RoutingTable, service_id: &str) -> SnippetSet {
    SnippetSet::new(
        origins_fragment(backends, service_id),
        recv_fragment(),
        route_fragment(table),
        fetch_fragment(),
        hash_fragment(),
    )
}

fn backend_decl(backend: &Backend, service_id: &str) -> BackendDecl {
    let probe = &backend.probe;
    let probe_props = vec![
        Property::new("dummy", PropValue::Bool(true)),
        Property::new("initial", PropValue::Int(probe.initial.into())),
        Property::new(
            "request",
            PropValue::Lines(vec![
                format!("{} {} HTTP/1.1", probe.method, probe.path),
                format!("Host: {}", probe.host),
                "Connection: close".to_string(),
            ]),
        ),
        Property::new("threshold", PropValue::Int(probe.threshold.into())),
        Property::new("timeout", PropValue::Seconds(probe.timeout_secs)),
        Property::new("window", PropValue::Int(probe.window.into())),
    ];

    BackendDecl {
        name: backend.name.clone(),
        properties: vec![
            Property::new("between_bytes_timeout", PropValue::Seconds(backend.between_bytes_timeout_secs)),
            Property::new("connect_timeout", PropValue::Seconds(backend.connect_timeout_secs)),
            Property::new("dynamic", PropValue::Bool(true)),
            Property::new("first_byte_timeout", PropValue::Seconds(backend.first_byte_timeout_secs)),
            Property::new("host", PropValue::Str(backend.host.clone())),
            Property::new("max_connections", PropValue::Int(MAX_CONNECTIONS.into())),
            Property::new("port", PropValue::Str(backend.port.to_string())),
            Property::new("share_key", PropValue::Str(service_id.to_string())),
            Property::new("probe", PropValue::Block(probe_props)),
        ],
    }
}

fn origins_fragment(backends: &[Backend], service_id: &str) -> Fragment {
    Fragment::Backends(backends.iter().map(|b| backend_decl(b, service_id)).collect())
}

fn recv_fragment() -> Fragment {
    Fragment::Statements(vec![
        Stmt::comment("header spoofing prevention"),
        Stmt::when(
            Cond::And(vec![
                Cond::Eq(Expr::var("fastly.ff.visits_this_service"), Expr::Int(0)),
                Cond::Eq(Expr::var("req.restarts"), Expr::Int(0)),
            ]),
            vec![Stmt::unset(HASH), Stmt::unset(IS_PASS), Stmt::unset(NEW_TTL)],
        ),
        Stmt::comment("parse request and set backend, ttl and hashing headers"),
        Stmt::set("req.backend", Expr::call(ROUTE_SUB, vec![])),
    ])
}

fn hash_term_expr(term: &HashTerm) -> Expr {
    match term {
        HashTerm::PathOnly => Expr::var("req.url.path"),
        HashTerm::FullUrl => Expr::var("req.url"),
        HashTerm::Header(name) => Expr::var(format!("req.http.{}", name)),
    }
}

/// Statements that set the backend and cache signals for one rule.
///
/// Every rule sets all three signals and rebuilds the hash key from its
/// own terms, so nothing set by the default rule survives into a case.
fn rule_signals(rule: &RouteRule) -> Vec<Stmt> {
    let mut stmts = vec![
        Stmt::set(BACKEND_VAR, Expr::var(rule.backend.clone())),
        Stmt::unset(HASH),
    ];

    match &rule.cache {
        CacheDecision::Bypass => {
            stmts.push(Stmt::set(IS_PASS, Expr::str("true")));
            stmts.push(Stmt::set(NEW_TTL, Expr::str("0")));
        }
        CacheDecision::Cache { ttl_seconds, hash } => {
            stmts.push(Stmt::set(IS_PASS, Expr::str("false")));
            stmts.push(Stmt::set(NEW_TTL, Expr::str(ttl_seconds.to_string())));
            for (i, term) in hash.iter().enumerate() {
                let value = if i == 0 {
                    hash_term_expr(term)
                } else {
                    Expr::Concat(vec![Expr::var(HASH), hash_term_expr(term)])
                };
                stmts.push(Stmt::set(HASH, value));
            }
        }
    }

    stmts
}

fn case_label(route_match: &RouteMatch) -> CaseLabel {
    match route_match {
        RouteMatch::Exact(literal) => CaseLabel::Exact(literal.clone()),
        RouteMatch::Regex(re) => CaseLabel::Regex(re.as_str().to_string()),
    }
}

fn route_fragment(table: &RoutingTable) -> Fragment {
    let mut body = vec![
        Stmt::DeclareLocal {
            name: BACKEND_VAR.to_string(),
            ty: "BACKEND".to_string(),
        },
        Stmt::comment("defaults for requests no path rule matches"),
    ];
    body.extend(rule_signals(&table.default_rule));

    let cases: Vec<Case> = table
        .path_rules
        .iter()
        .filter_map(|rule| {
            rule.route_match.as_ref().map(|m| Case {
                label: case_label(m),
                body: rule_signals(rule),
            })
        })
        .collect();

    if !cases.is_empty() {
        body.push(Stmt::comment("path rules, first match wins"));
        body.push(Stmt::Switch {
            subject: Expr::var("req.url.path"),
            cases,
        });
    }

    body.push(Stmt::Return(Expr::var(BACKEND_VAR)));

    Fragment::Subroutine(Subroutine {
        name: ROUTE_SUB.to_string(),
        return_type: Some("BACKEND".to_string()),
        body,
    })
}

fn fetch_fragment() -> Fragment {
    let new_ttl = || Expr::call("std.atoi", vec![Expr::var(NEW_TTL)]);

    let origin_sets_ttl = Cond::Or(vec![
        Cond::IsSet("beresp.http.Expires".into()),
        Cond::Matches(Expr::var("beresp.http.Surrogate-Control"), "max-age".into()),
        Cond::Matches(Expr::var("beresp.http.Cache-Control"), "(?:s-maxage|max-age)".into()),
    ]);

    Fragment::Statements(vec![
        Stmt::when(
            Cond::Eq(Expr::var(IS_PASS), Expr::str("true")),
            vec![Stmt::ReturnAction(Action::Pass)],
        ),
        Stmt::If {
            cond: origin_sets_ttl,
            then: vec![Stmt::comment("keep the ttl set by the origin")],
            otherwise: vec![
                Stmt::when(
                    Cond::Lt(Expr::var("beresp.status"), Expr::Int(399)),
                    vec![
                        Stmt::set("beresp.ttl", Expr::call("std.integer2time", vec![new_ttl()])),
                        Stmt::set(
                            "beresp.http.Cache-Control",
                            Expr::Concat(vec![Expr::str("public, max-age="), new_ttl()]),
                        ),
                    ],
                ),
                Stmt::when(
                    Cond::Eq(Expr::var(NEW_TTL), Expr::str("0")),
                    vec![Stmt::ReturnAction(Action::Pass)],
                ),
            ],
        },
    ])
}

fn hash_fragment() -> Fragment {
    Fragment::Statements(vec![Stmt::when(
        Cond::IsSet(HASH.into()),
        vec![
            Stmt::Append {
                target: "req.hash".into(),
                value: Expr::var(HASH),
            },
            Stmt::Append {
                target: "req.hash".into(),
                value: Expr::var("req.vcl.generation"),
            },
            Stmt::ReturnAction(Action::Hash),
        ],
    )])
}
