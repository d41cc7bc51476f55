pub mod binary_boundary;
pub mod linear_scan;
pub mod strategy_factory;
