//! Event filter for subscribers.

use crate::Event;

/// Type implements this trait can check if a event is wanted.
pub trait Filter {
    /// true if event is wanted, otherwise false.
    fn filter_event(&self, event: &Event) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&Event) -> bool,
{
    fn filter_event(&self, event: &Event) -> bool {
        self(event)
    }
}

/// Negative wrapper of a filter.
#[derive(Debug, Copy, Clone)]
pub struct Not<F> {
    filter: F,
}

impl<F> Filter for Not<F>
where
    F: Filter,
{
    fn filter_event(&self, event: &Event) -> bool {
        !self.filter.filter_event(event)
    }
}

/// If and only if a and b both pass, this filter will pass.
#[derive(Debug, Copy, Clone)]
pub struct And<FA, FB> {
    a: FA,
    b: FB,
}

impl<FA, FB> Filter for And<FA, FB>
where
    FA: Filter,
    FB: Filter,
{
    fn filter_event(&self, event: &Event) -> bool {
        self.a.filter_event(event) && self.b.filter_event(event)
    }
}

/// If a or b pass, this filter will pass.
#[derive(Debug, Copy, Clone)]
pub struct Or<FA, FB> {
    a: FA,
    b: FB,
}

impl<FA, FB> Filter for Or<FA, FB>
where
    FA: Filter,
    FB: Filter,
{
    fn filter_event(&self, event: &Event) -> bool {
        self.a.filter_event(event) || self.b.filter_event(event)
    }
}

/// Filter combinator.
pub trait FilterExt
where
    Self: Sized,
{
    /// Invert a filter.
    fn not(self) -> Not<Self> {
        Not { filter: self }
    }

    /// Return a new filter that pass a event only if self and other both pass it.
    fn and<F>(self, other: F) -> And<Self, F> {
        And { a: self, b: other }
    }

    /// Return a new filter that pass a event if self or other pass it.
    fn or<F>(self, other: F) -> Or<Self, F> {
        Or { a: self, b: other }
    }
}

impl<T> FilterExt for T where T: Filter {}

/// Filter that will pass all events.
#[derive(Debug, Copy, Clone)]
pub struct All;

impl Filter for All {
    fn filter_event(&self, _event: &Event) -> bool {
        true
    }
}

/// Create a filter that pass all events.
pub fn all() -> All {
    All
}

/// Filter that passes connect and disconnect events.
#[derive(Debug, Copy, Clone)]
pub struct Connectivity;

impl Filter for Connectivity {
    fn filter_event(&self, event: &Event) -> bool {
        matches!(event, Event::Connect | Event::Disconnect)
    }
}

/// Create a filter that passes connect and disconnect events.
pub fn connectivity() -> Connectivity {
    Connectivity
}

/// Filter that passes message events of one operation.
#[derive(Debug, Clone)]
pub struct ByOperation {
    op: String,
}

impl Filter for ByOperation {
    fn filter_event(&self, event: &Event) -> bool {
        matches!(event, Event::Message(message) if message.op == self.op)
    }
}

/// Create a filter that passes message events whose operation tag is `op`.
pub fn operation<S: Into<String>>(op: S) -> ByOperation {
    ByOperation { op: op.into() }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ws;

    fn block() -> Event {
        Event::Message(ws::Operation::new("block", serde_json::Value::Null))
    }

    #[test]
    fn test_basic_filters() {
        assert!(all().filter_event(&Event::Connect));
        assert!(connectivity().filter_event(&Event::Disconnect));
        assert!(!connectivity().filter_event(&block()));
        assert!(operation("block").filter_event(&block()));
        assert!(!operation("status").filter_event(&block()));
        assert!(!operation("block").filter_event(&Event::Connect));
    }

    #[test]
    fn test_combinators() {
        let f = operation("block").or(connectivity());
        assert!(f.filter_event(&block()));
        assert!(f.filter_event(&Event::Connect));

        let f = all().and(connectivity().not());
        assert!(f.filter_event(&block()));
        assert!(!f.filter_event(&Event::Disconnect));
    }

    #[test]
    fn test_closure_filter() {
        let f = |event: &Event| matches!(event, Event::Disconnect);
        assert!(f.filter_event(&Event::Disconnect));
        assert!(!f.not().filter_event(&Event::Disconnect));
    }
}
