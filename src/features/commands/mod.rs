mod collector;

pub use collector::CommandProbe;
