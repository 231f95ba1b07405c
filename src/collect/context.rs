//! Context stack entries and their output guards.

use crate::props::PropertyList;

use super::output::{HeaderFooterRefs, OutputElements};

/// Kind of a nesting level in the flow document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub enum ContextType {
    /// Root of the context stack. Never pushed or popped.
    Document,
    PageSpan,
    Header,
    Footer,
    Footnote,
    Paragraph,
    Span,
    Link,
    OrderedList,
    UnorderedList,
    ListElement,
    Table,
    TableRow,
    TableCell,
    /// Inline frame holding images and equations.
    Object,
}

impl ContextType {
    pub const COUNT: usize = 15;

    pub const ALL: [ContextType; Self::COUNT] = [
        ContextType::Document,
        ContextType::PageSpan,
        ContextType::Header,
        ContextType::Footer,
        ContextType::Footnote,
        ContextType::Paragraph,
        ContextType::Span,
        ContextType::Link,
        ContextType::OrderedList,
        ContextType::UnorderedList,
        ContextType::ListElement,
        ContextType::Table,
        ContextType::TableRow,
        ContextType::TableCell,
        ContextType::Object,
    ];

    /// Every type a caller can open and close.
    pub fn structural() -> impl Iterator<Item = ContextType> {
        Self::ALL.into_iter().skip(1)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Non-structural insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leaf {
    Text,
    Space,
    Tab,
    LineBreak,
    Image,
    Equation,
    CoveredTableCell,
}

impl Leaf {
    pub const ALL: [Leaf; 7] = [
        Leaf::Text,
        Leaf::Space,
        Leaf::Tab,
        Leaf::LineBreak,
        Leaf::Image,
        Leaf::Equation,
        Leaf::CoveredTableCell,
    ];
}

/// An event processed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Open(ContextType),
    Close(ContextType),
    Insert(Leaf),
    /// Suspend the top context (engine-internal).
    Save,
    /// Resume the most recently suspended context (engine-internal).
    Restore,
}

impl EventType {
    /// Number of distinct events; `Open`/`Close` of `Document` do not exist.
    pub const COUNT: usize = 2 * (ContextType::COUNT - 1) + Leaf::ALL.len() + 2;

    /// Every event, in index order.
    pub fn all() -> impl Iterator<Item = EventType> {
        ContextType::structural()
            .map(EventType::Open)
            .chain(ContextType::structural().map(EventType::Close))
            .chain(Leaf::ALL.into_iter().map(EventType::Insert))
            .chain([EventType::Save, EventType::Restore])
    }

    /// Dense index for table storage. `None` for the nonexistent
    /// `Open(Document)` / `Close(Document)`.
    pub(crate) fn index(self) -> Option<usize> {
        let structural = ContextType::COUNT - 1;
        match self {
            EventType::Open(ContextType::Document) | EventType::Close(ContextType::Document) => {
                None
            }
            EventType::Open(kind) => Some(kind.index() - 1),
            EventType::Close(kind) => Some(structural + kind.index() - 1),
            EventType::Insert(leaf) => Some(2 * structural + leaf as usize),
            EventType::Save => Some(Self::COUNT - 2),
            EventType::Restore => Some(Self::COUNT - 1),
        }
    }

    pub fn is_close(self) -> bool {
        matches!(self, EventType::Close(_))
    }
}

/// What an output guard opens and closes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Element {
    PageSpan(PropertyList, HeaderFooterRefs),
    Header(PropertyList, u32),
    Footer(PropertyList, u32),
    Footnote(PropertyList),
    Paragraph(PropertyList),
    Span(PropertyList),
    Link(PropertyList),
    OrderedList(PropertyList),
    UnorderedList(PropertyList),
    ListElement(PropertyList),
    Table(PropertyList),
    TableRow(PropertyList),
    TableCell(PropertyList),
}

impl Element {
    /// The element for a context, or `None` for the sink-invisible
    /// `Document` and `Object`.
    pub(crate) fn for_context(
        kind: ContextType,
        props: PropertyList,
        id: u32,
        refs: HeaderFooterRefs,
    ) -> Option<Element> {
        let element = match kind {
            ContextType::Document | ContextType::Object => return None,
            ContextType::PageSpan => Element::PageSpan(props, refs),
            ContextType::Header => Element::Header(props, id),
            ContextType::Footer => Element::Footer(props, id),
            ContextType::Footnote => Element::Footnote(props),
            ContextType::Paragraph => Element::Paragraph(props),
            ContextType::Span => Element::Span(props),
            ContextType::Link => Element::Link(props),
            ContextType::OrderedList => Element::OrderedList(props),
            ContextType::UnorderedList => Element::UnorderedList(props),
            ContextType::ListElement => Element::ListElement(props),
            ContextType::Table => Element::Table(props),
            ContextType::TableRow => Element::TableRow(props),
            ContextType::TableCell => Element::TableCell(props),
        };
        Some(element)
    }

    fn open(&self, out: &mut OutputElements) {
        match self {
            Element::PageSpan(props, refs) => out.add_open_page_span(props, *refs),
            Element::Header(props, id) => out.add_open_header(props, *id),
            Element::Footer(props, id) => out.add_open_footer(props, *id),
            Element::Footnote(props) => out.add_open_footnote(props),
            Element::Paragraph(props) => out.add_open_paragraph(props),
            Element::Span(props) => out.add_open_span(props),
            Element::Link(props) => out.add_open_link(props),
            Element::OrderedList(props) => out.add_open_ordered_list(props),
            Element::UnorderedList(props) => out.add_open_unordered_list(props),
            Element::ListElement(props) => out.add_open_list_element(props),
            Element::Table(props) => out.add_open_table(props),
            Element::TableRow(props) => out.add_open_table_row(props),
            Element::TableCell(props) => out.add_open_table_cell(props),
        }
    }

    fn close(&self, out: &mut OutputElements) {
        match self {
            Element::PageSpan(..) => out.add_close_page_span(),
            Element::Header(..) => out.add_close_header(),
            Element::Footer(..) => out.add_close_footer(),
            Element::Footnote(_) => out.add_close_footnote(),
            Element::Paragraph(_) => out.add_close_paragraph(),
            Element::Span(_) => out.add_close_span(),
            Element::Link(_) => out.add_close_link(),
            Element::OrderedList(_) => out.add_close_ordered_list(),
            Element::UnorderedList(_) => out.add_close_unordered_list(),
            Element::ListElement(_) => out.add_close_list_element(),
            Element::Table(_) => out.add_close_table(),
            Element::TableRow(_) => out.add_close_table_row(),
            Element::TableCell(_) => out.add_close_table_cell(),
        }
    }
}

/// Output activation guard.
///
/// Emits the physical open of its element lazily, at most once, and the
/// matching close exactly once if (and only if) the open was emitted. A
/// guard without an element is a dummy: it tracks state but records nothing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OutputHandler {
    element: Option<Element>,
    open: bool,
    closed: bool,
    continued: bool,
}

impl OutputHandler {
    pub(crate) fn new(element: Option<Element>) -> Self {
        Self {
            element,
            open: false,
            closed: false,
            continued: false,
        }
    }

    pub(crate) fn dummy() -> Self {
        Self::new(None)
    }

    #[cfg(test)]
    pub(crate) fn is_open(&self) -> bool {
        self.open
    }

    /// An explicit close of a guard that never opened must still produce an
    /// empty element, unless it is the empty tail of a resumed context.
    pub(crate) fn needs_open_on_close(&self) -> bool {
        !self.open && !self.continued
    }

    /// Emit the open if it has not been emitted yet.
    ///
    /// Parents are the caller's business: the engine opens the guards below
    /// this one on the stack first.
    pub(crate) fn open(&mut self, out: &mut OutputElements) {
        if self.open {
            return;
        }
        assert!(!self.closed, "output guard reopened after close");
        if let Some(element) = &self.element {
            element.open(out);
        }
        self.open = true;
    }

    /// Emit the close if the open was emitted.
    pub(crate) fn close(&mut self, out: &mut OutputElements) {
        if !self.open {
            return;
        }
        assert!(!self.closed, "output guard closed twice");
        if let Some(element) = &self.element {
            element.close(out);
        }
        self.closed = true;
    }

    /// Close now and become reusable; a later open emits a fresh element.
    pub(crate) fn reset(&mut self, out: &mut OutputElements) {
        self.close(out);
        self.open = false;
        self.closed = false;
        self.continued = true;
    }
}

/// One live nesting level on the active or suspended stack.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Context {
    pub(crate) kind: ContextType,
    pub(crate) output: OutputHandler,
    /// Created by the engine to host content, not requested by the caller.
    pub(crate) artificial: bool,
    /// Closing this context resumes the top of the suspended stack.
    pub(crate) restore: bool,
    /// A suspended context waits to be resumed on top of this one.
    pub(crate) restoring: bool,
}

impl Context {
    pub(crate) fn new(kind: ContextType, artificial: bool) -> Self {
        Self {
            kind,
            output: OutputHandler::dummy(),
            artificial,
            restore: false,
            restoring: false,
        }
    }

    pub(crate) fn document() -> Self {
        Self::new(ContextType::Document, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::output::Command;

    fn paragraph_guard() -> OutputHandler {
        OutputHandler::new(Some(Element::Paragraph(PropertyList::new())))
    }

    #[test]
    fn test_event_indices_are_dense() {
        let indices: Vec<usize> = EventType::all().filter_map(EventType::index).collect();
        assert_eq!(indices.len(), EventType::COUNT);
        assert_eq!(indices, (0..EventType::COUNT).collect::<Vec<_>>());
        assert_eq!(EventType::Open(ContextType::Document).index(), None);
    }

    #[test]
    fn test_guard_opens_once() {
        let mut out = OutputElements::new();
        let mut guard = paragraph_guard();
        guard.open(&mut out);
        guard.open(&mut out);
        guard.close(&mut out);

        assert_eq!(
            out.body(),
            &[Command::OpenParagraph(PropertyList::new()), Command::CloseParagraph]
        );
    }

    #[test]
    fn test_unopened_guard_closes_silently() {
        let mut out = OutputElements::new();
        let mut guard = paragraph_guard();
        assert!(guard.needs_open_on_close());
        guard.close(&mut out);
        assert!(out.body().is_empty());
    }

    #[test]
    fn test_reset_closes_and_marks_continued() {
        let mut out = OutputElements::new();
        let mut guard = paragraph_guard();
        guard.open(&mut out);
        guard.reset(&mut out);

        assert!(!guard.is_open());
        assert!(!guard.needs_open_on_close());
        assert_eq!(out.body().len(), 2);

        guard.open(&mut out);
        guard.close(&mut out);
        assert_eq!(out.body().len(), 4);
    }

    #[test]
    fn test_dummy_guard_records_nothing() {
        let mut out = OutputElements::new();
        let mut guard = OutputHandler::dummy();
        guard.open(&mut out);
        assert!(guard.is_open());
        guard.close(&mut out);
        assert!(out.body().is_empty());
    }

    #[test]
    #[should_panic(expected = "closed twice")]
    fn test_double_close_panics() {
        let mut out = OutputElements::new();
        let mut guard = paragraph_guard();
        guard.open(&mut out);
        guard.close(&mut out);
        guard.close(&mut out);
    }
}
