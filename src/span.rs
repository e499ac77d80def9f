use miette::SourceSpan;

/// Position relative to start of source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Idx(pub u32);

/// Holds a view into a source.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    start: Idx,
    len: u16,
}

impl Span {
    pub fn new(start: Idx, len: u16) -> Self {
        Span { start, len }
    }

    /// Span covering `range` of a single line.
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Span {
            start: Idx(range.start as u32),
            len: range.len().min(u16::MAX as usize) as u16,
        }
    }

    pub fn as_range(&self) -> std::ops::Range<usize> {
        let start = self.start.0 as usize;
        let end = start + self.len as usize;
        start..end
    }

    pub fn start(&self) -> usize {
        self.start.0 as usize
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Move the span forward, e.g. from line-relative to file-relative.
    pub fn shifted(self, by: usize) -> Self {
        Span {
            start: Idx(self.start.0 + by as u32),
            len: self.len,
        }
    }
}

impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.start().into(), value.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shifted_keeps_length() {
        let span = Span::from_range(3..7).shifted(10);
        assert_eq!(span.as_range(), 13..17);
        assert_eq!(span.len(), 4);
    }
}
