//! Value object trait: equality by value, not identity.
//!
//! `EcoMetrics`, `SwapSavings` and friends are value objects: they are derived
//! from the current cart, never stored, and two summaries with the same
//! numbers are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "modify" one, compute
/// a new one from the updated inputs.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Footprint {
///     co2e: f64,
///     water_liters: f64,
/// }
///
/// impl ValueObject for Footprint {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
