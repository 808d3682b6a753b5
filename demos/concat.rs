// demos/concat.rs

//! Bundle the Rust sources under `src/` and `demos/` into one file and
//! report its size.

use std::sync::Arc;

use slurp::fs::RealFileSystem;
use slurp::stages::{self, source};
use slurp::{Build, Context, Pipe, boxed, cli, logging};

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
    b.task("bundle", &[], |ctx: Context| async move {
        let sources = source::glob(&ctx, Arc::new(RealFileSystem), "src", &["**/*.rs"])?;
        let demos = source::glob(&ctx, Arc::new(RealFileSystem), "demos", &["*.rs", "!concat.rs"])?;

        Pipe::queue([sources, demos])
            .pipe_all([
                boxed(stages::filter(&ctx, "mock.rs")?),
                boxed(stages::concat(&ctx, "bundle.txt")),
                boxed(stages::list(&ctx)),
            ])
            .wait()
            .await?;
        anyhow::Ok(())
    })?;

    b.task("default", &["bundle"], |ctx: Context| async move {
        ctx.log().info("Bundle ready.");
        anyhow::Ok(())
    })
}
