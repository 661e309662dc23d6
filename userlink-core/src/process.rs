//! Single-pass rewrite of one document body.
//!
//! `process` is a pure function of the body and the resolver: no globals,
//! no I/O beyond what the resolver itself does.

use serde::Serialize;

use crate::error::{UserlinkError, UserlinkResult};
use crate::resolver::Resolver;
use crate::rewriter::rewrite_occurrence;
use crate::scanner::{find_next_macro, Scan, Terminator};

/// One user link that was replaced by plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub key: String,
    pub display_name: String,
    /// Byte offset of the macro in the input document
    pub offset: usize,
    pub terminator: Terminator,
    /// Name cached in the link body before it was replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_name: Option<String>,
}

/// Output of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenDocument {
    pub body: String,
    /// The body differs from the input
    pub changed: bool,
    /// User links seen, replaced or not
    pub macros: usize,
    pub substitutions: Vec<Substitution>,
}

impl RewrittenDocument {
    fn untouched(document: &str) -> Self {
        Self {
            body: document.to_string(),
            changed: false,
            macros: 0,
            substitutions: Vec::new(),
        }
    }

    /// The document contained no user links at all.
    pub fn no_macros(&self) -> bool {
        self.macros == 0
    }
}

/// Replaces every user link whose person the resolver no longer knows.
///
/// Errors abort the whole document: a link with no terminator yields
/// [`UserlinkError::MalformedMacro`], and a resolver failure is propagated
/// as [`UserlinkError::Lookup`]. Partial output is discarded.
pub fn process<R>(document: &str, resolver: &R) -> UserlinkResult<RewrittenDocument>
where
    R: Resolver + ?Sized,
{
    let mut out = String::with_capacity(document.len());
    let mut view = document;
    let mut macros = 0;
    let mut substitutions = Vec::new();

    loop {
        let base = document.len() - view.len();
        let head = match find_next_macro(view) {
            Scan::NotFound => break,
            Scan::Malformed { start } => return Err(UserlinkError::malformed(base + start)),
            Scan::Found(head) => head,
        };
        let occurrence = head
            .close(view)
            .ok_or_else(|| UserlinkError::malformed(base + head.start))?;

        out.push_str(&view[..occurrence.start]);
        let rewrite = rewrite_occurrence(view, &occurrence, resolver, &mut out)?;
        macros += 1;

        if rewrite.substituted {
            substitutions.push(Substitution {
                key: rewrite.key.to_string(),
                display_name: rewrite.display_name,
                offset: base + occurrence.start,
                terminator: occurrence.terminator,
                cached_name: occurrence.cached_name(view).map(str::to_string),
            });
        }

        view = &view[occurrence.start + rewrite.consumed..];
    }

    if macros == 0 {
        return Ok(RewrittenDocument::untouched(document));
    }

    out.push_str(view);
    // A departed user's display name could equal the macro text; compare
    // bytes rather than trusting the substitution count.
    let changed = out != document;

    Ok(RewrittenDocument {
        body: out,
        changed,
        macros,
        substitutions,
    })
}
