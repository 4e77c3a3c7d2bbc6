mod actions;
mod audio;
mod cli;
mod config;
mod engine;
mod gestures;
mod hand;
mod input;
mod logging;
mod pipeline;
mod tracker;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
