use std::{fmt, ops::Range};

use serde::{Deserialize, Serialize};

use crate::Span;

pub type Located<T> = (T, Loc);

/// Identifies a source file registered with the outer driver.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SourceId(u32);

impl SourceId {
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Loc {
    pub source: SourceId,
    pub span: Span,
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { source, span } = self;
        write!(f, "{span} in {source}")
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { source, span } = self;
        write!(f, "{span} in {source}")
    }
}

impl Loc {
    #[inline]
    pub fn new(source: SourceId, span: Span) -> Self {
        Self { source, span }
    }

    #[inline]
    pub fn from_range(source: SourceId, range: Range<usize>) -> Self {
        Self::new(source, Span::from(range))
    }

    #[inline]
    pub fn source(self) -> SourceId {
        self.source
    }

    #[inline]
    pub fn span(self) -> Span {
        self.span
    }
}
