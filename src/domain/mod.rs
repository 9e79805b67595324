// Domain layer: survey/report models and the ports the pipeline talks through.

pub mod model;
pub mod ports;
