pub mod settings;

pub use settings::{DemoMintConfig, Settings};
