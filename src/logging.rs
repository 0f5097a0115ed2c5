use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// 未设置RUST_LOG时的默认过滤规则
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "legal_agent_team=debug,info"
    } else {
        "legal_agent_team=info,warn"
    }
}

/// 初始化日志，RUST_LOG优先于默认规则；日志写到stderr，报告正文留在stdout
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(verbose)))
        .map_err(|e| anyhow::anyhow!("无法创建日志过滤器: {e}"))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("无法初始化日志: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
        assert!(default_directives(true).contains("debug"));
    }
}
