// demos/cancel.rs

//! Press ctrl+c while this runs: `turtle` leaves as soon as it sees the
//! cancellation, `rabbit` ignores it and keeps shutdown waiting.

use std::time::Duration;

use slurp::{Build, Context, cli, logging};
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
    b.task("turtle", &[], |ctx: Context| async move {
        ctx.log().info("Hello!");
        ctx.log()
            .warn("I will take at least 4 seconds unless cancelled.");
        tokio::select! {
            () = ctx.cancelled() => ctx.log().warn("Got cancel, leaving."),
            () = sleep(Duration::from_secs(4)) => ctx.log().info("I am done!"),
        }
        anyhow::Ok(())
    })?;

    b.task("medic", &[], |ctx: Context| async move {
        ctx.log().info("I might be able to help, go ahead.");
        anyhow::Ok(())
    })?;

    b.task("rabbit", &["medic"], |ctx: Context| async move {
        ctx.log().info("Hello, I am the fast one.");
        ctx.log().info("I take at least 4 seconds after cancel.");
        for i in 0..4 {
            ctx.log().info(format_args!("This is line {i} of my work."));
            sleep(Duration::from_millis(500)).await;
        }
        ctx.cancelled().await;
        ctx.log().info("Got cancel but nope. I am not leaving.");
        sleep(Duration::from_secs(4)).await;
        anyhow::Ok(())
    })?;

    b.task("default", &["turtle", "rabbit"], |ctx: Context| async move {
        ctx.log().info("Default task is running.");
        anyhow::Ok(())
    })?;

    b.defer(|| eprintln!("cleanup: nothing to release"));
    Ok(())
}
