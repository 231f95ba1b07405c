//! The transition table.
//!
//! Maps every `(current context, incoming event)` pair to exactly one
//! [`Action`]. The table is authored as per-context rule lists, then
//! validated once when first used:
//! - every pair has exactly one action (no duplicates, no gaps)
//! - `Document` never leaves
//! - every chain of auto-created containers ends in an open or an insert,
//!   so an artificial context is never created only to be left again

use once_cell::sync::Lazy;
use thiserror::Error;

use super::context::{ContextType, EventType, Leaf};

use ContextType::*;

/// What to do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handler {
    /// Bind the output of the freshly pushed context.
    Open,
    /// Close and pop the top context.
    Close,
    /// Record a leaf into the top context.
    Insert,
    /// The event cannot live here: drop or suspend the top context.
    Leave,
    /// Move the top context to the suspended stack.
    Save,
    /// Move the last suspended context back onto the active stack.
    Restore,
    /// Drop the event.
    Discard,
}

/// Action descriptor for one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Action {
    /// Context type on top once the action runs; pushing happens when it
    /// differs from the current one.
    pub(crate) target: ContextType,
    pub(crate) handler: Handler,
    /// Process the same event again afterwards.
    pub(crate) repeat: bool,
}

impl Action {
    fn new(target: ContextType, handler: Handler, repeat: bool) -> Self {
        Self {
            target,
            handler,
            repeat,
        }
    }

    /// Whether this action creates an artificial container.
    pub(crate) fn is_auto(&self) -> bool {
        self.handler == Handler::Open && self.repeat
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TableError {
    #[error("duplicate entry for {context:?} + {event:?}")]
    Duplicate {
        context: ContextType,
        event: EventType,
    },
    #[error("missing entry for {context:?} + {event:?}")]
    Missing {
        context: ContextType,
        event: EventType,
    },
    #[error("entry for nonexistent event {event:?}")]
    InvalidEvent { event: EventType },
    #[error("Document must not leave on {event:?}")]
    DocumentLeaves { event: EventType },
    #[error("auto-container chain from {context:?} + {event:?} does not settle")]
    Unsettled {
        context: ContextType,
        event: EventType,
    },
}

/// Rule list for a single context type.
struct Rules {
    context: ContextType,
    entries: Vec<(EventType, Action)>,
}

impl Rules {
    fn new(context: ContextType) -> Self {
        Self {
            context,
            entries: Vec::new(),
        }
    }

    fn add(mut self, events: &[EventType], action: Action) -> Self {
        for &event in events {
            self.entries.push((event, action));
        }
        self
    }

    /// Direct legal opens.
    fn open(self, children: &[ContextType]) -> Self {
        let mut rules = self;
        for &child in children {
            rules = rules.add(&[EventType::Open(child)], Action::new(child, Handler::Open, false));
        }
        rules
    }

    /// Synthesize `container` and hand it the same event.
    fn auto(self, events: &[EventType], container: ContextType) -> Self {
        self.add(events, Action::new(container, Handler::Open, true))
    }

    fn insert(self, leaves: &[Leaf]) -> Self {
        let context = self.context;
        let events: Vec<_> = leaves.iter().map(|&l| EventType::Insert(l)).collect();
        self.add(&events, Action::new(context, Handler::Insert, false))
    }

    fn leave(self, events: &[EventType]) -> Self {
        let context = self.context;
        self.add(events, Action::new(context, Handler::Leave, true))
    }

    fn discard(self, events: &[EventType]) -> Self {
        let context = self.context;
        self.add(events, Action::new(context, Handler::Discard, false))
    }

    /// Own close closes; a close of anything else closes this context first
    /// and passes the event down.
    fn closes(self) -> Self {
        let context = self.context;
        let mut rules = self;
        for kind in ContextType::structural() {
            let repeat = kind != context;
            rules = rules.add(
                &[EventType::Close(kind)],
                Action::new(context, Handler::Close, repeat),
            );
        }
        rules
    }
}

fn opens(kinds: &[ContextType]) -> Vec<EventType> {
    kinds.iter().map(|&k| EventType::Open(k)).collect()
}

fn inserts(leaves: &[Leaf]) -> Vec<EventType> {
    leaves.iter().map(|&l| EventType::Insert(l)).collect()
}

const CONTENT: [Leaf; 6] = [
    Leaf::Text,
    Leaf::Space,
    Leaf::Tab,
    Leaf::LineBreak,
    Leaf::Image,
    Leaf::Equation,
];

const CHARACTERS: [Leaf; 4] = [Leaf::Text, Leaf::Space, Leaf::Tab, Leaf::LineBreak];

const COVERED: [Leaf; 1] = [Leaf::CoveredTableCell];

/// Page spans, headers, footers, footnotes and table cells: hold blocks.
fn block_rules(context: ContextType, illegal: &[ContextType], covered_leaves: bool) -> Rules {
    let inline: Vec<ContextType> = [Footnote, Span, Link, Object]
        .into_iter()
        .filter(|kind| !illegal.contains(kind))
        .collect();
    let rules = Rules::new(context)
        .open(&[Paragraph, OrderedList, UnorderedList, Table])
        .auto(&opens(&inline), Paragraph)
        .auto(&opens(&[ListElement]), UnorderedList)
        .auto(&inserts(&CONTENT), Paragraph)
        .leave(&opens(illegal));
    if covered_leaves {
        rules.leave(&inserts(&COVERED))
    } else {
        rules.discard(&inserts(&COVERED))
    }
}

fn all_rules() -> Vec<Rules> {
    let covered = inserts(&COVERED);
    vec![
        Rules::new(Document)
            .open(&[PageSpan, Header, Footer])
            .auto(
                &opens(&[
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
                    Object,
                ]),
                PageSpan,
            )
            .auto(&inserts(&CONTENT), PageSpan)
            .discard(&covered)
            .discard(&ContextType::structural().map(EventType::Close).collect::<Vec<_>>()),
        block_rules(PageSpan, &[PageSpan], false)
            .open(&[Header, Footer])
            .auto(&opens(&[TableRow, TableCell]), Table)
            .closes(),
        block_rules(Header, &[PageSpan, Header, Footer], false)
            .auto(&opens(&[TableRow, TableCell]), Table)
            .closes(),
        block_rules(Footer, &[PageSpan, Header, Footer], false)
            .auto(&opens(&[TableRow, TableCell]), Table)
            .closes(),
        block_rules(Footnote, &[PageSpan, Header, Footer, Footnote], false)
            .auto(&opens(&[TableRow, TableCell]), Table)
            .closes(),
        block_rules(TableCell, &[PageSpan, Header, Footer, TableRow, TableCell], true).closes(),
        Rules::new(Paragraph)
            .open(&[Span, Link, Footnote])
            .auto(&opens(&[Object]), Span)
            .auto(&inserts(&CONTENT), Span)
            .leave(&opens(&[
                PageSpan,
                Header,
                Footer,
                Paragraph,
                OrderedList,
                UnorderedList,
                ListElement,
                Table,
                TableRow,
                TableCell,
            ]))
            .leave(&covered)
            .closes(),
        Rules::new(ListElement)
            .open(&[Span, Link, Footnote, OrderedList, UnorderedList])
            .auto(&opens(&[Object]), Span)
            .auto(&inserts(&CONTENT), Span)
            .leave(&opens(&[
                PageSpan,
                Header,
                Footer,
                Paragraph,
                ListElement,
                Table,
                TableRow,
                TableCell,
            ]))
            .leave(&covered)
            .closes(),
        Rules::new(Span)
            .open(&[Footnote, Object])
            .insert(&CHARACTERS)
            .auto(&inserts(&[Leaf::Image, Leaf::Equation]), Object)
            .leave(&opens(&[
                PageSpan,
                Header,
                Footer,
                Paragraph,
                Span,
                Link,
                OrderedList,
                UnorderedList,
                ListElement,
                Table,
                TableRow,
                TableCell,
            ]))
            .leave(&covered)
            .closes(),
        Rules::new(Link)
            .open(&[Span])
            .auto(&opens(&[Object]), Span)
            .auto(&inserts(&CONTENT), Span)
            .leave(&opens(&[
                PageSpan,
                Header,
                Footer,
                Footnote,
                Paragraph,
                Link,
                OrderedList,
                UnorderedList,
                ListElement,
                Table,
                TableRow,
                TableCell,
            ]))
            .leave(&covered)
            .closes(),
        list_rules(OrderedList),
        list_rules(UnorderedList),
        Rules::new(Table)
            .open(&[TableRow])
            .auto(
                &opens(&[
                    TableCell,
                    Footnote,
                    Paragraph,
                    Span,
                    Link,
                    OrderedList,
                    UnorderedList,
                    ListElement,
                    Table,
                    Object,
                ]),
                TableRow,
            )
            .auto(&inserts(&CONTENT), TableRow)
            .auto(&covered, TableRow)
            .leave(&opens(&[PageSpan, Header, Footer]))
            .closes(),
        Rules::new(TableRow)
            .open(&[TableCell])
            .auto(
                &opens(&[
                    Footnote,
                    Paragraph,
                    Span,
                    Link,
                    OrderedList,
                    UnorderedList,
                    ListElement,
                    Table,
                    Object,
                ]),
                TableCell,
            )
            .auto(&inserts(&CONTENT), TableCell)
            .insert(&COVERED)
            .leave(&opens(&[PageSpan, Header, Footer, TableRow]))
            .closes(),
        Rules::new(Object)
            .insert(&[Leaf::Image, Leaf::Equation])
            .leave(&ContextType::structural().map(EventType::Open).collect::<Vec<_>>())
            .leave(&inserts(&CHARACTERS))
            .leave(&covered)
            .closes(),
    ]
}

fn list_rules(list: ContextType) -> Rules {
    Rules::new(list)
        .open(&[ListElement])
        .auto(
            &opens(&[Footnote, Span, Link, Object, OrderedList, UnorderedList]),
            ListElement,
        )
        .auto(&inserts(&CONTENT), ListElement)
        .leave(&opens(&[
            PageSpan, Header, Footer, Paragraph, Table, TableRow, TableCell,
        ]))
        .leave(&inserts(&COVERED))
        .closes()
}

/// Validated `(context, event) -> action` table.
pub(crate) struct TransitionTable {
    entries: Vec<Option<Action>>,
}

static TABLE: Lazy<TransitionTable> = Lazy::new(|| match TransitionTable::build() {
    Ok(table) => table,
    Err(e) => panic!("invalid transition table: {e}"),
});

impl TransitionTable {
    /// The process-wide table.
    pub(crate) fn get() -> &'static TransitionTable {
        &TABLE
    }

    fn slot(context: ContextType, event: EventType) -> Option<usize> {
        event
            .index()
            .map(|e| context.index() * EventType::COUNT + e)
    }

    pub(crate) fn build() -> Result<Self, TableError> {
        Self::from_rules(all_rules())
    }

    fn from_rules(rules: Vec<Rules>) -> Result<Self, TableError> {
        let mut entries = vec![None; ContextType::COUNT * EventType::COUNT];

        for rule in rules {
            let context = rule.context;
            let wildcard = [
                (EventType::Save, Action::new(context, Handler::Save, false)),
                (EventType::Restore, Action::new(context, Handler::Restore, false)),
            ];
            for (event, action) in rule.entries.into_iter().chain(wildcard) {
                let slot =
                    Self::slot(context, event).ok_or(TableError::InvalidEvent { event })?;
                if entries[slot].is_some() {
                    return Err(TableError::Duplicate { context, event });
                }
                entries[slot] = Some(action);
            }
        }

        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), TableError> {
        for context in ContextType::ALL {
            for event in EventType::all() {
                let Some(action) = self.try_lookup(context, event) else {
                    return Err(TableError::Missing { context, event });
                };
                if context == Document && action.handler == Handler::Leave {
                    return Err(TableError::DocumentLeaves { event });
                }
                if action.is_auto() {
                    self.check_settles(context, event)?;
                }
            }
        }
        Ok(())
    }

    /// Follow auto-container transitions from `context`; the chain has to end
    /// in a direct open or an insert before it runs out of context types.
    fn check_settles(&self, context: ContextType, event: EventType) -> Result<(), TableError> {
        let mut current = context;
        for _ in 0..ContextType::COUNT {
            let action = self
                .try_lookup(current, event)
                .ok_or(TableError::Missing { context: current, event })?;
            match action.handler {
                Handler::Open if action.repeat => current = action.target,
                Handler::Open | Handler::Insert => return Ok(()),
                _ => return Err(TableError::Unsettled { context, event }),
            }
        }
        Err(TableError::Unsettled { context, event })
    }

    fn try_lookup(&self, context: ContextType, event: EventType) -> Option<Action> {
        Self::slot(context, event).and_then(|slot| self.entries[slot])
    }

    /// Look up the action for a pair.
    ///
    /// The table is total over every event the engine can produce, so a
    /// missing entry is a defect in the engine, not in the input.
    pub(crate) fn lookup(&self, context: ContextType, event: EventType) -> Action {
        match self.try_lookup(context, event) {
            Some(action) => action,
            None => unreachable!("no transition for {context:?} + {event:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(context: ContextType, event: EventType) -> Action {
        TransitionTable::get().lookup(context, event)
    }

    #[test]
    fn test_table_builds() {
        assert!(TransitionTable::build().is_ok());
    }

    #[test]
    fn test_direct_open() {
        let action = lookup(Paragraph, EventType::Open(Span));
        assert_eq!(action, Action::new(Span, Handler::Open, false));
    }

    #[test]
    fn test_text_at_document_opens_page_span() {
        let action = lookup(Document, EventType::Insert(Leaf::Text));
        assert_eq!(action, Action::new(PageSpan, Handler::Open, true));
        assert!(action.is_auto());
    }

    #[test]
    fn test_close_escalates() {
        let action = lookup(Paragraph, EventType::Close(PageSpan));
        assert_eq!(action, Action::new(Paragraph, Handler::Close, true));

        let own = lookup(Paragraph, EventType::Close(Paragraph));
        assert_eq!(own, Action::new(Paragraph, Handler::Close, false));
    }

    #[test]
    fn test_bad_nesting_leaves() {
        let action = lookup(Span, EventType::Open(Paragraph));
        assert_eq!(action.handler, Handler::Leave);
        assert!(action.repeat);
    }

    #[test]
    fn test_wildcards_everywhere() {
        for context in ContextType::ALL {
            assert_eq!(lookup(context, EventType::Save).handler, Handler::Save);
            assert_eq!(lookup(context, EventType::Restore).handler, Handler::Restore);
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut rules = all_rules();
        rules[0] = Rules::new(Document)
            .open(&[PageSpan])
            .open(&[PageSpan]);
        assert_eq!(
            TransitionTable::from_rules(rules).err(),
            Some(TableError::Duplicate {
                context: Document,
                event: EventType::Open(PageSpan),
            })
        );
    }

    #[test]
    fn test_missing_rejected() {
        let mut rules = all_rules();
        rules.retain(|r| r.context != Object);
        assert!(matches!(
            TransitionTable::from_rules(rules),
            Err(TableError::Missing { context: Object, .. })
        ));
    }

    #[test]
    fn test_unsettled_chain_rejected() {
        let mut rules = all_rules();
        let paragraph = rules
            .iter()
            .position(|r| r.context == Paragraph)
            .expect("paragraph rules");
        // Text in a paragraph would create a span that leaves on text.
        rules[paragraph] = Rules::new(Paragraph)
            .auto(&inserts(&CONTENT), Span)
            .leave(&ContextType::structural().map(EventType::Open).collect::<Vec<_>>())
            .leave(&covered_events())
            .closes();
        let span = rules
            .iter()
            .position(|r| r.context == Span)
            .expect("span rules");
        rules[span] = Rules::new(Span)
            .leave(&ContextType::structural().map(EventType::Open).collect::<Vec<_>>())
            .leave(&inserts(&Leaf::ALL))
            .closes();

        assert!(matches!(
            TransitionTable::from_rules(rules),
            Err(TableError::Unsettled { .. })
        ));
    }

    fn covered_events() -> Vec<EventType> {
        inserts(&COVERED)
    }
}
