//! Snippet assembly subsystem.
//!
//! # Data Flow
//! ```text
//! Backend[] + RoutingTable + service id
//!     → assembler.rs (typed fragments per artifact)
//!     → vcl.rs (fragment model, text rendering)
//!     → SnippetSet (always five artifacts, fixed order)
//! ```
//!
//! # Design Decisions
//! - The artifact set is fixed; empty inputs still produce all five
//! - Bodies are typed fragments, rendered to text only at the edge
//! - A fresh set is built per compile; nothing is patched in place

pub mod assembler;
pub mod vcl;

use serde::Serialize;

pub use assembler::assemble;
use vcl::Fragment;

/// Names of the five artifacts, in upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetName {
    Origins,
    Recv,
    Parse,
    Fetch,
    Hash,
}

impl SnippetName {
    pub const ALL: [SnippetName; 5] = [
        SnippetName::Origins,
        SnippetName::Recv,
        SnippetName::Parse,
        SnippetName::Fetch,
        SnippetName::Hash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnippetName::Origins => "origins",
            SnippetName::Recv => "recv",
            SnippetName::Parse => "parse",
            SnippetName::Fetch => "fetch",
            SnippetName::Hash => "hash",
        }
    }

    /// Insertion point of the artifact on the platform.
    pub fn snippet_type(&self) -> SnippetType {
        match self {
            SnippetName::Origins | SnippetName::Parse => SnippetType::Init,
            SnippetName::Recv => SnippetType::Recv,
            SnippetName::Fetch => SnippetType::Fetch,
            SnippetName::Hash => SnippetType::Hash,
        }
    }
}

impl std::fmt::Display for SnippetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform insertion point for a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetType {
    /// Top level: backend declarations and custom subroutines.
    Init,
    Recv,
    Fetch,
    Hash,
}

impl SnippetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnippetType::Init => "init",
            SnippetType::Recv => "recv",
            SnippetType::Fetch => "fetch",
            SnippetType::Hash => "hash",
        }
    }
}

/// One compiled artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub name: SnippetName,
    pub body: Fragment,
}

impl Snippet {
    pub fn snippet_type(&self) -> SnippetType {
        self.name.snippet_type()
    }

    /// Rendered VCL text.
    pub fn content(&self) -> String {
        self.body.to_string()
    }
}

/// Rendered view of a snippet, as returned by the compile endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedSnippet {
    pub name: SnippetName,
    #[serde(rename = "type")]
    pub snippet_type: SnippetType,
    pub content: String,
}

impl From<&Snippet> for RenderedSnippet {
    fn from(snippet: &Snippet) -> Self {
        Self {
            name: snippet.name,
            snippet_type: snippet.snippet_type(),
            content: snippet.content(),
        }
    }
}

/// The full artifact set, one per [`SnippetName`], in fixed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetSet {
    snippets: [Snippet; 5],
}

impl SnippetSet {
    pub(crate) fn new(
        origins: Fragment,
        recv: Fragment,
        parse: Fragment,
        fetch: Fragment,
        hash: Fragment,
    ) -> Self {
        Self {
            snippets: [
                Snippet { name: SnippetName::Origins, body: origins },
                Snippet { name: SnippetName::Recv, body: recv },
                Snippet { name: SnippetName::Parse, body: parse },
                Snippet { name: SnippetName::Fetch, body: fetch },
                Snippet { name: SnippetName::Hash, body: hash },
            ],
        }
    }

    pub fn get(&self, name: SnippetName) -> &Snippet {
        // Positions follow SnippetName::ALL.
        &self.snippets[name as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snippet> {
        self.snippets.iter()
    }

    pub fn rendered(&self) -> Vec<RenderedSnippet> {
        self.iter().map(RenderedSnippet::from).collect()
    }
}
