use anyhow::{Context, Result};
use exam_simulator::{logger, App, Config, SetId};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init_with_verbose(config.verbose_logging);

    // 第一个参数为套号，默认第 1 套
    let set_id = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u8>()
            .with_context(|| format!("无法解析套号: {}", arg))?,
        None => 1,
    };

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    app.run(SetId::new(set_id)).await?;

    Ok(())
}
