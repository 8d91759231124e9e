mod world;

pub use world::{KopiWorld, MarketSystem};
