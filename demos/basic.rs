use std::env;
use std::fs;
use std::io::Read;
use std::process::exit;

use svg2beziers::{read_document, to_path_data, ReadOptions};

fn main() {
    env_logger::init();

    let args: Vec<_> = env::args().collect();
    match args.len() {
        2 => {}
        _ => {
            println!("Usage: {} <path/to/file.svg>", args[0]);
            exit(1);
        }
    };

    let mut file = fs::File::open(&args[1]).unwrap();
    let mut s = String::new();
    file.read_to_string(&mut s).unwrap();

    let document = read_document(&s, &ReadOptions::default()).unwrap_or_else(|e| {
        println!("Error: {}", e);
        exit(2);
    });

    println!(
        "Viewport {}x{}, {} figures.",
        document.width,
        document.height,
        document.figures.len()
    );
    for figure in &document.figures {
        println!(
            "{:?} {}: {}",
            figure.kind,
            figure.id.as_deref().unwrap_or("-"),
            to_path_data(&figure.transformed_paths())
        );
    }
}
