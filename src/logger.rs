//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`；`verbose` 为真时默认 `debug`。
pub fn init_with_verbose(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
