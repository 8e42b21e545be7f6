//! Value types passed across ports.

use std::fmt;

/// A place a render writes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RenderSurface {
    /// The main story root
    StoryRoot,
    /// The docs page root
    DocsRoot,
    /// A nested mount point inside a docs page
    Element(String),
}

impl fmt::Display for RenderSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderSurface::StoryRoot => f.write_str("#root"),
            RenderSurface::DocsRoot => f.write_str("#docs-root"),
            RenderSurface::Element(id) => write!(f, "#{id}"),
        }
    }
}
