pub mod fixtures;
pub mod scripted_host;

pub use fixtures::{SampleDatabase, sample_database};
pub use scripted_host::ScriptedHost;
