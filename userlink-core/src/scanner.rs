//! Locates user-link macros in storage-format markup.
//!
//! A user link is written as the start marker, a quoted user key, and one of
//! three terminator variants:
//!
//! ```text
//! <ac:link><ri:user ri:userkey="8a09c088436c2b310143b4ea8e330037" /></ac:link>
//!
//! <ac:link><ri:user ri:userkey="8a09c088423dfa2b01423dfaca2d0264" />
//! <ac:plain-text-link-body><![CDATA[Bill Fischofer]]></ac:plain-text-link-body>
//! </ac:link>
//!
//! <ac:link><ri:user ri:userkey="8a09c088423dfa2b01423dfac8ba01d2" />
//! <ac:link-body><span>Vicky Janicki</span></ac:link-body></ac:link>
//! ```
//!
//! (The last two appear on a single line in stored documents.)
//!
//! The scanner works on suffix views of the document and only reports
//! offsets relative to that view. It never allocates.

use serde::Serialize;

/// Literal that opens every user link.
pub const MACRO_START: &str = "<ac:link><ri:user ri:userkey=";

/// The closing-sequence variants of a user link.
///
/// Declaration order is the tie-break order when two opening literals start
/// at the same offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminator {
    /// `/></ac:link>`, a bare reference with no cached name
    Bare,
    /// Cached name in a CDATA plain-text link body
    PlainTextBody,
    /// Cached name in a rich-markup link body
    RichBody,
}

impl Terminator {
    /// All variants in tie-break order.
    pub const ALL: [Terminator; 3] = [Self::Bare, Self::PlainTextBody, Self::RichBody];

    /// The literal that ends the user key and selects this variant.
    pub const fn opening(self) -> &'static str {
        match self {
            Self::Bare => "/></ac:link>",
            Self::PlainTextBody => "/><ac:plain-text-link-body><![CDATA[",
            Self::RichBody => "/><ac:link-body>",
        }
    }

    /// The literal that closes the cached-name payload, if the variant has one.
    pub const fn closing(self) -> Option<&'static str> {
        match self {
            Self::Bare => None,
            Self::PlainTextBody => Some("]]></ac:plain-text-link-body></ac:link>"),
            Self::RichBody => Some("</ac:link-body></ac:link>"),
        }
    }
}

impl std::fmt::Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bare => write!(f, "bare"),
            Self::PlainTextBody => write!(f, "plain-text body"),
            Self::RichBody => write!(f, "rich body"),
        }
    }
}

/// Outcome of searching a view for the next user link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// No start marker left in the view.
    NotFound,
    /// A start marker whose terminator variant was identified.
    Found(MacroHead),
    /// A start marker with no opening literal of any variant after it.
    Malformed {
        /// Offset of the start marker in the view
        start: usize,
    },
}

/// A located start marker plus the variant that governs it.
///
/// Offsets are relative to the view passed to [`find_next_macro`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroHead {
    /// Offset of the start marker
    pub start: usize,
    /// First byte of the raw user key
    pub key_start: usize,
    /// Offset of the winning variant's opening literal
    pub key_end: usize,
    pub terminator: Terminator,
}

impl MacroHead {
    /// Completes the occurrence by locating the end of its closing sequence.
    ///
    /// Returns `None` when a two-part variant's closing literal never appears.
    pub fn close(&self, view: &str) -> Option<Occurrence> {
        let body_start = self.key_end + self.terminator.opening().len();
        let (body_end, end) = match self.terminator.closing() {
            None => (body_start, body_start),
            Some(closing) => {
                let at = body_start + view.get(body_start..)?.find(closing)?;
                (at, at + closing.len())
            }
        };

        Some(Occurrence {
            start: self.start,
            key_start: self.key_start,
            key_end: self.key_end,
            body_start,
            body_end,
            end,
            terminator: self.terminator,
        })
    }
}

/// A fully delimited user link within a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: usize,
    pub key_start: usize,
    pub key_end: usize,
    /// Cached-name payload bounds; empty for [`Terminator::Bare`]
    pub body_start: usize,
    pub body_end: usize,
    /// One past the last byte of the closing sequence
    pub end: usize,
    pub terminator: Terminator,
}

impl Occurrence {
    /// The user key exactly as written, quotes and whitespace included.
    pub fn raw_key<'a>(&self, view: &'a str) -> &'a str {
        &view[self.key_start..self.key_end]
    }

    /// The whole macro, start marker through closing sequence.
    pub fn span<'a>(&self, view: &'a str) -> &'a str {
        &view[self.start..self.end]
    }

    /// The display name cached inside the link body, if any.
    pub fn cached_name<'a>(&self, view: &'a str) -> Option<&'a str> {
        match self.terminator {
            Terminator::Bare => None,
            _ => Some(&view[self.body_start..self.body_end]),
        }
    }

    /// Length of the macro in bytes.
    pub fn byte_len(&self) -> usize {
        self.end - self.start
    }
}

/// Shared prefix of every variant's opening literal.
const OPENING_PREFIX: &str = "/>";

/// Earliest opening literal in `rest`, plus how far into `rest` the search
/// read. Candidates are visited left to right, so no byte is read twice and
/// the search stops at the winner.
fn first_terminator(rest: &str) -> (Option<(usize, Terminator)>, usize) {
    for (pos, _) in rest.match_indices(OPENING_PREFIX) {
        let tail = &rest[pos..];
        if let Some(t) = Terminator::ALL
            .into_iter()
            .find(|t| tail.starts_with(t.opening()))
        {
            return (Some((pos, t)), pos + t.opening().len());
        }
    }
    (None, rest.len())
}

/// Finds the next user link in `view` and classifies its terminator.
///
/// The variant whose opening literal appears earliest after the start
/// marker wins; ties go to the earlier-declared variant.
pub fn find_next_macro(view: &str) -> Scan {
    let Some(start) = view.find(MACRO_START) else {
        return Scan::NotFound;
    };
    let key_start = start + MACRO_START.len();

    match first_terminator(&view[key_start..]).0 {
        Some((pos, terminator)) => Scan::Found(MacroHead {
            start,
            key_start,
            key_end: key_start + pos,
            terminator,
        }),
        None => Scan::Malformed { start },
    }
}
