//! Console realization of the confirmation prompt.

use autorun_session::{Decision, Prompt, PromptRequest};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Modal confirm/cancel prompt on the controlling terminal. One question, one
/// line of input; EOF or anything but an affirmative answer counts as cancel.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    async fn confirm(&mut self, request: PromptRequest<'_>) -> Decision {
        println!(
            "\u{201c}{}\u{201d} contains software intended to be automatically started.",
            request.mount_name
        );
        println!("If you don't trust this location or aren't sure, answer no.");
        println!("Would you like to run it? [y/N]");

        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut line).await {
            Ok(0) | Err(_) => Decision::Cancelled,
            Ok(_) => match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => Decision::Approved,
                _ => Decision::Cancelled,
            },
        }
    }

    fn dismiss(&mut self) {
        println!();
        println!("The medium was removed; nothing will be run.");
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("There was a problem running this software.");
        eprintln!("{}", message);
    }
}
