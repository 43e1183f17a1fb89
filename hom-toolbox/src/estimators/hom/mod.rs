//! Hong-Ou-Mandel interference visibility.
//!
//! Two measurement schemes share the integration core:
//!
//! * `single` — one histogram; the central dip is compared against the
//!   side-peak reference of the same curve.
//! * `dual` — a pair of histograms recorded with orthogonal and parallel
//!   polarisation; the two curves are jointly normalised and the parallel
//!   central dip is compared against the orthogonal one.

pub mod dual;
pub mod single;

pub use dual::{hom_dual, DualHomParams, DualHomResult, ManualGeometry};
pub use single::hom_single;
