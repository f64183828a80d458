pub mod check;
pub mod regions;
pub mod simulate;
