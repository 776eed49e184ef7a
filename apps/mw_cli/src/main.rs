// apps/mw_cli/src/main.rs

//! MantleWave 命令行界面
//!
//! 提供剪切波模拟的命令行工具。
//!
//! # 架构层级
//!
//! 本模块属于应用层：只组合配置结构体与求解器对象，
//! 不出现任何数值内核逻辑。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// MantleWave 剪切波求解器命令行工具
#[derive(Parser)]
#[command(name = "mw_cli")]
#[command(author = "MantleWave Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MantleWave axisymmetric shear wave solver", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行全阶模拟
    Run(commands::run::RunArgs),
    /// 运行降阶模拟
    Rom(commands::rom::RomArgs),
    /// 显示网格与算子信息
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Rom(args) => commands::rom::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}
