use clap::Parser;
use secretbind::config::Command;

fn main() -> anyhow::Result<()> {
    let cfg = secretbind::config::Config::parse();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            if matches!(cfg.command, Command::Wipe) {
                secretbind::wipe(cfg).await
            } else {
                secretbind::run(cfg).await
            }
        })
}
