
/// Sequential and random sweeps through both engines.
pub mod sweep;
