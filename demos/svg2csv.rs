use std::env;
use std::fs;
use std::io::Read;
use std::process::exit;

use svg2beziers::{self, Polyline, FLATTENING_TOLERANCE};

use csv::Writer;

fn main() {
    // Logging
    env_logger::init();

    // Argument parsing
    let args: Vec<_> = env::args().collect();
    match args.len() {
        2 => {}
        _ => {
            println!("Usage: {} <path/to/file.svg>", args[0]);
            exit(1);
        }
    };

    // Load file
    let mut file = fs::File::open(&args[1]).unwrap();
    let mut s = String::new();
    file.read_to_string(&mut s).unwrap();

    // Flatten all figures
    let polylines: Vec<Polyline> =
        svg2beziers::parse(&s, FLATTENING_TOLERANCE).unwrap_or_else(|e| {
            println!("Error: {}", e);
            exit(2);
        });

    // One CSV file per polyline
    println!("Found {} polylines.", polylines.len());
    for (num, line) in polylines.iter().enumerate() {
        let mut wtr = Writer::from_path(format!("polyline_{}.csv", num)).unwrap();
        for point in line {
            wtr.serialize(point).unwrap();
        }
        wtr.flush().unwrap();
    }
}
