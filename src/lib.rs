pub mod bot;
pub mod config;
pub mod errors;
pub mod models;
pub mod runtime;
pub mod storage;
pub mod system;

#[cfg(test)]
mod test_support;

// 重新导出常用类型
pub use config::AppConfig;
pub use errors::AppError;
