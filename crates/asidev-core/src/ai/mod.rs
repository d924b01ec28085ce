pub mod deepseek;

pub use deepseek::DeepSeekClient;
