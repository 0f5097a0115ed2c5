use anyhow::Result;
use clap::Parser;
use legal_agent_team::{cli, launch, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    // 自定义查询缺少问题时，在读取文档和调用模型之前拒绝
    let request = args.analysis_request()?;
    let document = args.document.clone();
    let config = args.into_config()?;

    logging::init(config.verbose)?;

    launch(&config, &document, &request).await
}
