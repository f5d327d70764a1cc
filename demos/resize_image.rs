//! Shrink a single image, protecting one rectangle.
//!
//! Usage:
//! ```sh
//! cargo run --example resize_image -- input.png output.png 75 x,y,w,h
//! ```

use std::env;
use std::process;

use content_aware_resize::{process_file, ProcessOptions, Rect};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <input> <output> <width-percent> [x,y,w,h]", args[0]);
        process::exit(1);
    }

    let width_percent: f32 = args[3].parse().unwrap_or_else(|e| {
        eprintln!("Invalid width percent '{}': {e}", args[3]);
        process::exit(1);
    });
    let protect: Vec<Rect> = match args.get(4).map(|s| s.parse::<Rect>()) {
        Some(Ok(rect)) => vec![rect],
        Some(Err(e)) => {
            eprintln!("Invalid rectangle: {e}");
            process::exit(1);
        }
        None => Vec::new(),
    };

    let opts = ProcessOptions {
        width_percent,
        protect,
        ..ProcessOptions::default()
    };
    let result = process_file(args[1].as_ref(), args[2].as_ref(), &opts);

    if result.skipped {
        println!("Skipped: {}", result.message);
    } else if result.success {
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
