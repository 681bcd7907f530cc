use std::{env, process};

use braid::Braid;

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut braid = Braid::new();

    match args.len() {
        1 => braid.run_prompt(),
        2 => braid.run_file(&args[1]),
        _ => {
            eprintln!("Usage: braid [script]");
            process::exit(64);
        }
    }
}
