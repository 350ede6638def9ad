mod prompt;

use autorun_mount::MountMonitor;
use autorun_session::{ProcessExecutor, SessionOutcome};
use clap::Parser;
use prompt::ConsolePrompt;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "autorun-prompt")]
#[command(about = "Prompt to run autorun software found on a mounted medium")]
struct Cli {
    /// Location of the mounted medium (a path or a file:// URI)
    location: String,

    /// How often to check whether the medium is still mounted, in milliseconds
    #[arg(long, default_value_t = 500)]
    poll_interval_ms: u64,
}

// Every path exits 0, including failures: the launcher that spawns us treats
// a nonzero status as something worth alarming the user about, and there is
// no corrective action a caller could take anyway.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return;
        }
    };

    let monitor = MountMonitor::new(Duration::from_millis(cli.poll_interval_ms));
    let mount = match monitor.resolve(&cli.location) {
        Ok(mount) => mount,
        Err(err) => {
            tracing::warn!("Unable to find device for {}: {}", cli.location, err);
            return;
        }
    };

    let mut prompt = ConsolePrompt;
    let mut executor = ProcessExecutor;
    match autorun_session::run(&mount, &mut prompt, &mut executor).await {
        // The session already showed the failure to the user.
        SessionOutcome::Failed(err) => tracing::debug!("Session failed: {}", err),
        outcome => tracing::debug!("Session ended: {:?}", outcome),
    }
}
