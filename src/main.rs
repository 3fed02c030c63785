use std::process;

use anyhow::{Context, Result, bail};

use mission_presenter::{config::Script, logging, player::Player};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const PLAY_USAGE: &str = "mission-presenter play [script.json]";
const SCRIPT_USAGE: &str = "mission-presenter script";

fn run() -> Result<()> {
    logging::init()?;
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("play") => play(args.next().as_deref()),
        Some("script") => {
            println!("{}", Script::default().to_json()?);
            Ok(())
        }
        _ => bail!(
            "Mission Presenter — a four-scene terminal presentation\n\nUsage:\n  {PLAY_USAGE}\n  {SCRIPT_USAGE}"
        ),
    }
}

fn play(path: Option<&str>) -> Result<()> {
    let script = match path {
        Some(path) => Script::load(path).with_context(|| format!("Failed to load {path}"))?,
        None => Script::default(),
    };
    let mut player = Player::new(script);
    player.play()
}
