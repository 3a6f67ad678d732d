//! rsutag-inspect：读取运行时 JSON 转储，输出 Profile 分析快照
//!
//! 运行命令：
//! cargo run --features cli -- runtime.json --loader-source initcfg.js --rules-source loadrules.js

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rsutag_inspector::{
    ConfigManager, FileSourceAccessor, HtmlExtractor, ProfileAnalyzer, RuntimeState, SnapshotCache,
};

#[derive(Debug, Parser)]
#[command(name = "rsutag-inspect", version, about = "utag Profile 分析")]
struct Cli {
    /// 运行时状态 JSON 转储
    runtime: PathBuf,

    /// loader 配置初始化函数源码
    #[arg(long)]
    loader_source: Option<PathBuf>,

    /// 规则评估函数源码
    #[arg(long)]
    rules_source: Option<PathBuf>,

    /// 页面 HTML，用于定位引用的 Profile
    #[arg(long)]
    html: Option<PathBuf>,

    /// 快照缓存文件；存在时输出与上一次分析的差异
    #[arg(long)]
    cache: Option<PathBuf>,

    /// 不解析加载规则条件
    #[arg(long)]
    no_conditions: bool,

    /// 协议相对地址补全使用的协议
    #[arg(long, default_value = "https")]
    scheme: String,

    /// 详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigManager::custom()
        .parse_conditions(!cli.no_conditions)
        .default_scheme(cli.scheme.clone())
        .verbose(cli.verbose)
        .build();
    let analyzer = ProfileAnalyzer::new(config)?;

    if let Some(html_path) = &cli.html {
        let html = tokio::fs::read_to_string(html_path)
            .await
            .with_context(|| format!("读取 HTML 失败：{}", html_path.display()))?;
        let page = HtmlExtractor::new().extract(&html);
        for location in page.locate_profiles(&cli.scheme) {
            info!(
                "页面引用 Profile：{}/{}/{} | {}",
                location.account, location.profile, location.environment, location.url
            );
        }
        if !page.has_inline_data_layer() {
            warn!("页面未内联声明 utag_data");
        }
    }

    let runtime_json = tokio::fs::read_to_string(&cli.runtime)
        .await
        .with_context(|| format!("读取运行时转储失败：{}", cli.runtime.display()))?;
    let runtime = RuntimeState::from_json_str(&runtime_json)?;
    let accessor = FileSourceAccessor::new(cli.loader_source.clone(), cli.rules_source.clone());

    let start_instant = Instant::now();
    let snapshot = analyzer.analyze_with_accessor(Some(&runtime), &accessor).await?;
    info!("分析耗时: {:.3} 毫秒", start_instant.elapsed().as_secs_f64() * 1000.0);

    println!("{}", snapshot.to_json_pretty()?);

    if let Some(cache_path) = &cli.cache {
        let mut cache = if cache_path.exists() {
            SnapshotCache::load_from_file(cache_path).await?
        } else {
            SnapshotCache::new()
        };
        if let Some(diff) = cache.store(snapshot) {
            if diff.is_empty() {
                info!("与上一次分析相比无变化");
            } else {
                info!("与上一次分析的差异：\n{}", serde_json::to_string_pretty(&diff)?);
            }
        }
        cache.save_to_file(cache_path).await?;
    }

    Ok(())
}
