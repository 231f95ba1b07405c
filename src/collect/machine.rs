//! The normalization engine.
//!
//! [`StackMachine`] owns the active context stack, the suspended stack and the
//! event queue. Each caller event is queued and the queue is drained before
//! the call returns; anything the engine synthesizes on the way (repeated
//! events, save, restore) is put at the front of the queue, so one caller
//! event always settles completely before the next is accepted.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::props::PropertyList;

use super::context::{Context, ContextType, Element, EventType, Leaf, OutputHandler};
use super::output::{HeaderFooterRefs, OutputElements};
use super::transition::{Action, Handler, TransitionTable};

/// Data that accompanies a caller event while it is being processed.
#[derive(Debug, Clone, Default)]
pub(crate) struct Payload {
    pub(crate) props: PropertyList,
    pub(crate) text: String,
    pub(crate) id: u32,
    pub(crate) refs: HeaderFooterRefs,
}

impl Payload {
    pub(crate) fn props(props: PropertyList) -> Self {
        Self {
            props,
            ..Self::default()
        }
    }

    pub(crate) fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }
}

pub(crate) struct StackMachine {
    active: Vec<Context>,
    suspended: Vec<Context>,
    queue: VecDeque<EventType>,
    /// Events queued by the handler that is running, ahead of any repeat.
    followups: Vec<EventType>,
    payload: Payload,
    table: &'static TransitionTable,
}

impl Default for StackMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StackMachine {
    pub(crate) fn new() -> Self {
        Self {
            active: vec![Context::document()],
            suspended: Vec::new(),
            queue: VecDeque::new(),
            followups: Vec::new(),
            payload: Payload::default(),
            table: TransitionTable::get(),
        }
    }

    /// Process one caller event to completion.
    ///
    /// The payload is visible to handlers only while this call runs.
    pub(crate) fn handle(&mut self, event: EventType, payload: Payload, out: &mut OutputElements) {
        self.payload = payload;
        self.queue.push_back(event);
        while let Some(event) = self.queue.pop_front() {
            self.dispatch(event, out);
        }
        self.payload = Payload::default();
        self.debug_check_invariants();
    }

    /// Close everything the engine opened on its own.
    ///
    /// Fails if a context the caller opened is still open, or if a suspended
    /// context was never resumed.
    pub(crate) fn finish(&mut self, out: &mut OutputElements) -> Result<()> {
        loop {
            let top = self.top();
            // Resume first: what comes back may be a context the caller owns.
            if top.restoring {
                self.handle(EventType::Restore, Payload::default(), out);
                continue;
            }
            if top.kind == ContextType::Document {
                break;
            }
            if !top.artificial {
                return Err(Error::UnclosedContext { context: top.kind });
            }
            // Closed directly: a close event would be passed on to an
            // explicit context of the same type.
            self.close(out);
            for event in std::mem::take(&mut self.followups) {
                self.handle(event, Payload::default(), out);
            }
        }

        if !self.suspended.is_empty() {
            return Err(Error::SuspendedContexts {
                count: self.suspended.len(),
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn suspended_len(&self) -> usize {
        self.suspended.len()
    }

    /// Types on the active stack, bottom first.
    pub(crate) fn active_kinds(&self) -> Vec<ContextType> {
        self.active.iter().map(|c| c.kind).collect()
    }

    fn top(&self) -> &Context {
        // The document context is never popped.
        &self.active[self.active.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Context {
        let last = self.active.len() - 1;
        &mut self.active[last]
    }

    fn dispatch(&mut self, event: EventType, out: &mut OutputElements) {
        let Some(action) = self.resolve(event) else {
            return;
        };
        let current = self.top().kind;
        log::trace!(
            target: "folio::machine",
            "{current:?} + {event:?} -> {:?} {:?}{}",
            action.target,
            action.handler,
            if action.repeat { " (repeat)" } else { "" }
        );

        if action.target != current {
            let mut context = Context::new(action.target, action.repeat);
            let parent = self.top_mut();
            if parent.restoring {
                parent.restoring = false;
                context.restore = true;
            }
            self.active.push(context);
        }

        self.run(action.handler, event, action.repeat, out);

        let mut front = std::mem::take(&mut self.followups);
        if action.repeat {
            front.push(event);
        }
        for event in front.into_iter().rev() {
            self.queue.push_front(event);
        }
    }

    /// Pick the action for `event` against the current top.
    ///
    /// Before consulting the table:
    /// - a pending restore is honoured for close events, and for opens and
    ///   leaves the suspended context can take itself
    /// - closes of contexts that exist nowhere are dropped
    /// - a close meant for an explicit context passes through artificial
    ///   contexts of the same type
    /// - an artificial context holding a restore is closed when the context
    ///   it owes can take the next open or leaf
    fn resolve(&self, event: EventType) -> Option<Action> {
        let top = self.top();
        if top.restoring && self.resumes_first(event) {
            return Some(Action {
                target: top.kind,
                handler: Handler::Restore,
                repeat: true,
            });
        }

        match event {
            EventType::Close(kind) if !self.is_known(kind) => {
                log::warn!(target: "folio::machine", "dropping close of {kind:?}: nothing to close");
                return None;
            }
            EventType::Close(kind)
                if top.kind == kind && top.artificial && self.has_explicit(kind) =>
            {
                log::debug!(target: "folio::machine", "close of {kind:?} passes artificial {kind:?}");
                return Some(Action {
                    target: kind,
                    handler: Handler::Close,
                    repeat: true,
                });
            }
            EventType::Open(_) | EventType::Insert(_)
                if top.artificial && top.restore && self.resumes_first(event) =>
            {
                return Some(Action {
                    target: top.kind,
                    handler: Handler::Close,
                    repeat: true,
                });
            }
            _ => {}
        }

        Some(self.table.lookup(top.kind, event))
    }

    /// Whether the last suspended context should come back before `event`.
    fn resumes_first(&self, event: EventType) -> bool {
        match event {
            EventType::Close(_) => true,
            EventType::Open(_) | EventType::Insert(_) => self
                .suspended
                .last()
                .is_some_and(|waiting| self.accepts(waiting.kind, event)),
            _ => false,
        }
    }

    /// Whether `kind` takes `event` without leaving or dropping it.
    fn accepts(&self, kind: ContextType, event: EventType) -> bool {
        !matches!(
            self.table.lookup(kind, event).handler,
            Handler::Leave | Handler::Discard
        )
    }

    fn has_explicit(&self, kind: ContextType) -> bool {
        self.active
            .iter()
            .chain(&self.suspended)
            .any(|c| c.kind == kind && !c.artificial)
    }

    fn is_known(&self, kind: ContextType) -> bool {
        self.active.iter().chain(&self.suspended).any(|c| c.kind == kind)
    }

    fn run(&mut self, handler: Handler, event: EventType, repeat: bool, out: &mut OutputElements) {
        match handler {
            Handler::Open => self.open(repeat),
            Handler::Close => self.close(out),
            Handler::Insert => self.insert(event, out),
            Handler::Leave => self.leave(out),
            Handler::Save => self.save(out),
            Handler::Restore => self.restore(),
            Handler::Discard => {
                log::warn!(target: "folio::machine", "discarding {event:?} in {:?}", self.top().kind);
            }
        }
    }

    /// Bind the guard of the context that was just pushed. Artificial
    /// contexts carry no properties; explicit ones take the caller's.
    fn open(&mut self, artificial: bool) {
        let payload = if artificial {
            Payload::default()
        } else {
            std::mem::take(&mut self.payload)
        };
        let top = self.top_mut();
        let element = Element::for_context(top.kind, payload.props, payload.id, payload.refs);
        top.output = OutputHandler::new(element);
    }

    fn close(&mut self, out: &mut OutputElements) {
        let top = self.active.len() - 1;
        assert!(top > 0, "attempt to close the document context");
        if !self.active[top].artificial && self.active[top].output.needs_open_on_close() {
            self.open_through(top, out);
        }

        let Some(mut context) = self.active.pop() else {
            unreachable!("active stack is never empty");
        };
        debug_assert!(!context.restoring, "closing {:?} with a pending restore", context.kind);
        context.output.close(out);
        if context.restore {
            self.followups.push(EventType::Restore);
        }
    }

    fn insert(&mut self, event: EventType, out: &mut OutputElements) {
        let EventType::Insert(leaf) = event else {
            unreachable!("insert handler for {event:?}");
        };
        let top = self.active.len() - 1;
        self.open_through(top, out);

        let props = &self.payload.props;
        match leaf {
            Leaf::Text => out.add_text(&self.payload.text),
            Leaf::Space => out.add_space(),
            Leaf::Tab => out.add_tab(),
            Leaf::LineBreak => out.add_line_break(),
            Leaf::Image => out.add_binary_object(props),
            Leaf::Equation => out.add_equation(props),
            Leaf::CoveredTableCell => out.add_covered_table_cell(props),
        }
    }

    /// An artificial context nobody waits on is simply dropped; anything else
    /// is suspended so it can resume once the offending content is done.
    fn leave(&mut self, out: &mut OutputElements) {
        let top = self.top();
        if top.artificial && !top.restore && !top.restoring {
            log::debug!(target: "folio::machine", "dropping artificial {:?}", top.kind);
            let Some(mut context) = self.active.pop() else {
                unreachable!("active stack is never empty");
            };
            context.output.close(out);
        } else {
            self.followups.push(EventType::Save);
        }
    }

    fn save(&mut self, out: &mut OutputElements) {
        assert!(self.active.len() > 1, "attempt to suspend the document context");
        let Some(mut context) = self.active.pop() else {
            unreachable!("active stack is never empty");
        };
        log::debug!(target: "folio::machine", "suspending {:?}", context.kind);
        context.output.reset(out);
        self.suspended.push(context);

        let parent = self.top_mut();
        debug_assert!(!parent.restoring, "{:?} already restoring", parent.kind);
        parent.restoring = true;
    }

    fn restore(&mut self) {
        let Some(context) = self.suspended.pop() else {
            panic!("restore with an empty suspended stack");
        };
        log::debug!(target: "folio::machine", "resuming {:?}", context.kind);
        self.top_mut().restoring = false;
        self.active.push(context);
    }

    /// Open every guard from the bottom of the stack up to `index`.
    fn open_through(&mut self, index: usize, out: &mut OutputElements) {
        for context in &mut self.active[..=index] {
            context.output.open(out);
        }
    }

    fn debug_check_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        assert_eq!(self.active[0].kind, ContextType::Document);
        assert!(
            self.active[1..].iter().all(|c| c.kind != ContextType::Document),
            "document context pushed twice"
        );
        let last = self.active.len() - 1;
        assert!(
            self.active[..last].iter().all(|c| !c.restoring),
            "restoring flag below the top of the stack"
        );
        let owed = self
            .active
            .iter()
            .chain(&self.suspended)
            .map(|c| c.restore as usize + c.restoring as usize)
            .sum::<usize>();
        assert_eq!(owed, self.suspended.len(), "restore chain out of step");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::output::Command;

    use ContextType::*;

    fn run(machine: &mut StackMachine, out: &mut OutputElements, events: &[EventType]) {
        for &event in events {
            let payload = match event {
                EventType::Insert(Leaf::Text) => Payload::text("x"),
                _ => Payload::default(),
            };
            machine.handle(event, payload, out);
        }
    }

    #[test]
    fn test_text_builds_container_chain() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(&mut machine, &mut out, &[EventType::Insert(Leaf::Text)]);

        assert_eq!(machine.active_kinds(), vec![Document, PageSpan, Paragraph, Span]);
        assert_eq!(out.body().len(), 4);
        assert_eq!(out.body()[3], Command::InsertText("x".to_string()));
    }

    #[test]
    fn test_finish_closes_artificial() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(&mut machine, &mut out, &[EventType::Insert(Leaf::Space)]);
        machine.finish(&mut out).expect("finish");

        assert_eq!(machine.depth(), 1);
        assert_eq!(
            out.body().last(),
            Some(&Command::ClosePageSpan),
            "outermost container closes last"
        );
    }

    #[test]
    fn test_finish_rejects_explicit_context() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(&mut machine, &mut out, &[EventType::Open(Paragraph)]);

        let err = machine.finish(&mut out).unwrap_err();
        assert!(matches!(err, Error::UnclosedContext { context: Paragraph }));
    }

    #[test]
    fn test_illegal_nesting_suspends() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(
            &mut machine,
            &mut out,
            &[
                EventType::Open(Paragraph),
                EventType::Open(Span),
                EventType::Open(Paragraph),
            ],
        );

        // Both the span and the paragraph were suspended.
        assert_eq!(machine.suspended_len(), 2);
        assert_eq!(machine.active_kinds(), vec![Document, PageSpan, Paragraph]);

        run(&mut machine, &mut out, &[EventType::Close(Paragraph)]);
        // The outer paragraph is back; its span still waits.
        assert_eq!(machine.suspended_len(), 1);
        assert_eq!(machine.active_kinds(), vec![Document, PageSpan, Paragraph]);

        run(
            &mut machine,
            &mut out,
            &[EventType::Close(Span), EventType::Close(Paragraph)],
        );
        assert_eq!(machine.suspended_len(), 0);
        machine.finish(&mut out).expect("finish");
    }

    #[test]
    fn test_abandoned_artificial_never_opens() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        // A cell gets an artificial row, then an explicit row arrives inside it.
        run(
            &mut machine,
            &mut out,
            &[EventType::Open(Table), EventType::Open(TableCell)],
        );
        run(&mut machine, &mut out, &[EventType::Open(TableRow)]);

        // The artificial row holding the cell is suspended because the cell is
        // explicit; nothing has been recorded yet.
        assert!(out.body().is_empty());
        run(
            &mut machine,
            &mut out,
            &[
                EventType::Close(TableRow),
                EventType::Close(TableCell),
                EventType::Close(Table),
            ],
        );
        machine.finish(&mut out).expect("finish");
    }

    #[test]
    fn test_open_resumes_waiting_context() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(
            &mut machine,
            &mut out,
            &[
                EventType::Open(ListElement),
                EventType::Open(Paragraph),
                EventType::Close(Paragraph),
            ],
        );
        assert_eq!(machine.suspended_len(), 1);

        // The list element takes spans itself, so it comes back first.
        run(&mut machine, &mut out, &[EventType::Open(Span)]);
        assert_eq!(machine.suspended_len(), 0);
        assert_eq!(
            machine.active_kinds(),
            vec![Document, PageSpan, UnorderedList, ListElement, Span]
        );
    }

    #[test]
    fn test_restore_holder_closed_before_leaf() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(
            &mut machine,
            &mut out,
            &[
                EventType::Open(Span),
                EventType::Open(ListElement),
                EventType::Close(ListElement),
            ],
        );
        // The artificial list owes the paragraph and span it interrupted.
        assert_eq!(machine.active_kinds(), vec![Document, PageSpan, UnorderedList]);

        run(&mut machine, &mut out, &[EventType::Insert(Leaf::Text)]);
        assert_eq!(machine.active_kinds(), vec![Document, PageSpan, Paragraph, Span]);
        assert_eq!(machine.suspended_len(), 0);
    }

    #[test]
    fn test_close_passes_artificial_of_same_type() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(
            &mut machine,
            &mut out,
            &[
                EventType::Open(Paragraph),
                EventType::Open(TableCell),
                EventType::Close(TableCell),
                EventType::Insert(Leaf::Text),
            ],
        );
        // The text got its own paragraph inside the table; the caller's
        // paragraph still waits.
        assert_eq!(
            machine.active_kinds(),
            vec![Document, PageSpan, Table, TableRow, TableCell, Paragraph, Span]
        );
        assert_eq!(machine.suspended_len(), 1);

        run(&mut machine, &mut out, &[EventType::Close(Paragraph)]);
        assert_eq!(machine.active_kinds(), vec![Document, PageSpan]);
        assert_eq!(machine.suspended_len(), 0);
        machine.finish(&mut out).expect("finish");
    }

    #[test]
    fn test_stray_close_dropped() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(
            &mut machine,
            &mut out,
            &[EventType::Open(Paragraph), EventType::Close(Table)],
        );
        assert_eq!(machine.active_kinds(), vec![Document, PageSpan, Paragraph]);
    }

    #[test]
    fn test_covered_cell_outside_table_discarded() {
        let mut machine = StackMachine::new();
        let mut out = OutputElements::new();
        run(&mut machine, &mut out, &[EventType::Insert(Leaf::CoveredTableCell)]);
        assert_eq!(machine.depth(), 1);
        assert!(out.body().is_empty());
    }
}
