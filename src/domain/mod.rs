pub mod errors;
pub mod medicine;
pub mod order;
pub mod pharmacy;
pub mod ports;
pub mod reference;
