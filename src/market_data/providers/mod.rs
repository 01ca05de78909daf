pub mod alt;
pub mod magic_eden;

pub use alt::AltValuationSource;
pub use magic_eden::MagicEdenInventory;
