use clap::{Parser, Subcommand};
use rustem::config::{ConfigLoader, RustemConfig};
use rustem::launcher::Launcher;
use rustem::reporter::RunnerReporter;
use rustem::{AppContext, ProcessRunner, Runner, ServerLink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 配置文件路径，默认自动查找 rustem.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 显示全部测试结果
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 列出配置的启动器
    Launchers,
    /// 启动一个进程执行端并收集输出
    Run { launcher: String },
}

fn load_config(path: Option<PathBuf>) -> Result<RustemConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::find_and_load()?
            .ok_or_else(|| anyhow::anyhow!("No rustem.toml found"))?,
    };
    Ok(config)
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config)?;
    let reporter = RunnerReporter::new(cli.verbose);

    match cli.command {
        Commands::Launchers => {
            for (name, launcher) in &config.launchers {
                println!("{}: {} {}", name, launcher.command, launcher.args.join(" "));
            }
        }
        Commands::Run { launcher } => {
            let launcher_config = config.launcher(&launcher)?;
            let (link, _server_events) = ServerLink::new();
            let app: Arc<dyn AppContext> = Arc::new(link);

            let mut runner = ProcessRunner::new(&app, Launcher::spawn(launcher_config)?);
            info!(runner = %runner.id(), "Running launcher {}", launcher);
            runner.run().await;

            reporter.print_log(&launcher, &runner.log_output());
            reporter.print_summary(runner.name(), runner.results());
        }
    }

    Ok(())
}
