// demos/concurrency.rs

//! `turtle` fails after three seconds while `rabbit` finishes; `default`
//! is then skipped with a failed-dependency report.

use std::time::Duration;

use anyhow::anyhow;
use slurp::{Build, Context, Task, cli, logging};
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("slurp error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    slurp::run(args, setup).await
}

fn setup(b: &mut Build) -> slurp::errors::Result<()> {
    b.register([
        Task::new("turtle")
            .usage("Slow and doomed.")
            .action(|ctx: Context| async move {
                ctx.log().info("Hello!");
                ctx.log().warn("I will take at least 3 seconds.");
                sleep(Duration::from_secs(3)).await;
                ctx.log().info("Well, here is a line.");
                Err::<(), _>(anyhow!("I died."))
            }),
        Task::new("medic")
            .usage("Always ready.")
            .action(|ctx: Context| async move {
                ctx.log().info("I might be able to help, go ahead.");
                anyhow::Ok(())
            }),
        Task::new("rabbit")
            .usage("Fast, after the medic.")
            .description("Prints four lines, half a second apart.")
            .after("medic")
            .action(|ctx: Context| async move {
                ctx.log().info("Hello, I am the fast one.");
                for i in 0..4 {
                    ctx.log().info(format_args!("This is line {i} of my work."));
                    sleep(Duration::from_millis(500)).await;
                }
                anyhow::Ok(())
            }),
        Task::new("default")
            .usage("Run turtle and rabbit.")
            .deps(["turtle", "rabbit"])
            .action(|ctx: Context| async move {
                ctx.log().info("Default task is running.");
                anyhow::Ok(())
            }),
    ])
}
