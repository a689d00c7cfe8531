// Domain layer: scheduling models, operation results and the ports the core depends on.

pub mod model;
pub mod outcome;
pub mod ports;
