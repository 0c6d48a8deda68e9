//! Geocoin entry point
//!
//! Native: a line-oriented driver. Reads commands from stdin, applies them to
//! a game saved in a JSON file, prints the status after each one.
//!
//! Usage: `geocoin [SAVE_FILE] [CONFIG_FILE]`
//!
//! WASM: the browser talks to `geocoin::web::WebGame` instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::io::{self, BufRead, Write};
    use std::path::{Path, PathBuf};

    use geocoin::persistence::FileStore;
    use geocoin::{Command, Controller, WorldConfig};

    env_logger::init();
    log::info!("Geocoin (native) starting...");

    let mut args = std::env::args().skip(1);
    let save_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("geocoin_save.json"));
    let config = args
        .next()
        .map(|path| WorldConfig::load(Path::new(&path)))
        .unwrap_or_default();

    let store = match FileStore::open(&save_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Can't open save file {}: {}", save_path.display(), e);
            std::process::exit(1);
        }
    };
    let mut controller = Controller::load(config, store);
    let startup = controller.take_view();
    println!("{} caches nearby", startup.changes.shown.len());
    println!("{}", startup.status_line());
    println!("Commands: n/s/e/w, goto <lat> <lng>, collect <i> <j>, deposit <i> <j>,");
    println!("          track on|off, lost, reset, look, quit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("stdin: {}", e);
                break;
            }
        };
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "q" => break,
            "look" => {
                let view = controller.view();
                for cache in view.visible_caches() {
                    let reach = if cache.in_reach { " (in reach)" } else { "" };
                    println!("  cache {} - {} coins{}", cache.cell, cache.coins.len(), reach);
                }
                println!("{}", view.status_line());
                continue;
            }
            _ => {}
        }

        match line.parse::<Command>() {
            Ok(command) => match controller.apply(command) {
                Ok(view) => {
                    for cell in &view.changes.spawned {
                        println!("  new cache at {}", cell);
                    }
                    println!("{}", view.status_line());
                }
                Err(e) => println!("! {}", e),
            },
            Err(e) => println!("? {}", e),
        }
        let _ = stdout.flush();
    }

    log::info!("Geocoin exiting");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}
