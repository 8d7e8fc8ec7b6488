//! Naming traits for state and event enums.
//!
//! States and events are closed enums. Every variant has a stable name used
//! for transition log entries, path hashing and generated test names.

/// A state enum.
///
/// ```rust
/// use statepath_core::StateName;
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Door {
///     Open,
///     Closed,
/// }
///
/// impl StateName for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "Open");
/// ```
pub trait StateName {
    /// Stable variant name.
    fn name(&self) -> &str;
}

/// An event enum with a fixed, enumerable variant set.
pub trait EventName {
    /// Stable variant name.
    fn name(&self) -> &str;

    /// Names of every variant of the enum.
    ///
    /// Graph construction rejects transitions registered for names that are
    /// not listed here.
    fn variants() -> &'static [&'static str];

    /// True when [`name`](EventName::name) is one of [`variants`](EventName::variants).
    ///
    /// Transitions are looked up by `name()` but registered against
    /// `variants()`, so an event whose name is not declared can never match.
    fn is_declared(&self) -> bool
    where
        Self: Sized,
    {
        Self::variants().contains(&self.name())
    }
}
