//! Screen components.

pub mod taxes;

pub use taxes::TaxesScreen;
