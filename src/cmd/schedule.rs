use clap::Args;

use super::{BackoffArgs, Run};

#[derive(Debug, Args)]
pub struct Schedule {
    #[command(flatten)]
    backoff: BackoffArgs,
    /// Number of attempts to print
    #[arg(long, default_value_t = 10)]
    count: u32,
}

impl Schedule {
    /// One line per attempt, ending early at the first error.
    fn lines(&self) -> Vec<String> {
        let mut backoff = self.backoff.build();
        let mut lines = Vec::new();

        for attempt in 1..=self.count {
            match backoff.next_attempt() {
                Ok(delay) => lines.push(format!("{attempt}\t{}ms", delay.as_millis())),
                Err(e) => {
                    lines.push(format!("{attempt}\t{e}"));
                    break;
                }
            }
        }

        lines
    }
}

impl Run for Schedule {
    type Response = ();

    async fn run(self) -> anyhow::Result<Self::Response> {
        for line in self.lines() {
            println!("{line}");
        }

        Ok(())
    }
}
