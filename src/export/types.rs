//! Export types and errors.

use thiserror::Error;

use crate::source::Origin;

/// Errors from exporting a distribution.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The CloudFront API call failed.
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    /// The API response lacked a field the document needs.
    #[error("{operation} response has no {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// A behavior as the distribution references it, before policies are
/// resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BehaviorRef {
    /// `None` for the default behavior.
    pub path_pattern: Option<String>,
    pub target_origin_id: String,
    pub cache_policy_id: Option<String>,
    pub origin_request_policy_id: Option<String>,
    pub response_headers_policy_id: Option<String>,
}

/// Distribution settings fetched in one call.
#[derive(Debug, Clone)]
pub struct DistributionSettings {
    pub origins: Vec<Origin>,
    pub default_behavior: BehaviorRef,
    pub behaviors: Vec<BehaviorRef>,
}

/// Policy families a behavior can reference by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Cache,
    OriginRequest,
    ResponseHeaders,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Cache => "cache",
            PolicyKind::OriginRequest => "origin-request",
            PolicyKind::ResponseHeaders => "response-headers",
        }
    }
}

/// One row of the behavior summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub path_pattern: String,
    pub target_origin: String,
    pub cache_policy: String,
    pub origin_request_policy: String,
    pub response_headers_policy: String,
}

impl SummaryRow {
    fn cells(&self) -> [&str; 5] {
        [
            &self.path_pattern,
            &self.target_origin,
            &self.cache_policy,
            &self.origin_request_policy,
            &self.response_headers_policy,
        ]
    }
}

const SUMMARY_HEADERS: [&str; 5] = [
    "PathPattern",
    "TargetOrigin",
    "CachePolicy",
    "OriginRequestPolicy",
    "ResponseHeadersPolicy",
];

/// Render rows as a GitHub-flavoured markdown table with padded columns.
pub fn render_summary(rows: &[SummaryRow]) -> String {
    let mut widths = SUMMARY_HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cells: [&str; 5]| {
        out.push('|');
        for (cell, width) in cells.iter().zip(widths) {
            out.push_str(&format!(" {:<width$} |", cell, width = width));
        }
        out.push('\n');
    };

    line(&mut out, SUMMARY_HEADERS);
    out.push('|');
    for width in widths {
        out.push_str(&"-".repeat(width + 2));
        out.push('|');
    }
    out.push('\n');
    for row in rows {
        line(&mut out, row.cells());
    }
    out
}
