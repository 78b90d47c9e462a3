pub mod reports;
pub mod runner;
pub mod seeds;
pub mod store;

pub use reports::LeagueView;
pub use runner::{BatchPlan, BatchResult, BatchRunner};
pub use seeds::parse_seed;
pub use store::TesterStore;
