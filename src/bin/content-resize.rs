use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use content_aware_resize::{
    default_output_path, process_directory, process_file, CarveOrder, ProcessOptions,
    ProcessResult, Rect, MAX_PERCENT, MIN_PERCENT,
};

#[derive(Parser)]
#[command(
    name = "content-resize",
    about = "Shrink images by seam carving while keeping logos and text intact",
    version,
    after_help = "Simple usage: content-resize <image> --width-percent 80  (writes {name}_resized.{ext})\n\n\
                  Protected regions come from --protect rectangles, --text-box OCR boxes\n\
                  (merged and padded), or a grayscale --mask image. The tool only shrinks."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_resized.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Output width as a percentage of the original (10-100)
    #[arg(long, default_value = "100")]
    width_percent: f32,

    /// Output height as a percentage of the original (10-100)
    #[arg(long, default_value = "100")]
    height_percent: f32,

    /// Absolute output width in pixels (overrides --width-percent)
    #[arg(long)]
    width: Option<u32>,

    /// Absolute output height in pixels (overrides --height-percent)
    #[arg(long)]
    height: Option<u32>,

    /// Remove rows before columns instead of columns before rows
    #[arg(long)]
    height_first: bool,

    /// Protect a rectangle given as x,y,width,height (repeatable)
    #[arg(long, value_name = "X,Y,W,H")]
    protect: Vec<Rect>,

    /// Text bounding box given as x,y,width,height (repeatable)
    #[arg(long, value_name = "X,Y,W,H")]
    text_box: Vec<Rect>,

    /// Merge text boxes closer than this many pixels
    #[arg(long, default_value = "12")]
    text_proximity: u32,

    /// Padding around merged text regions in pixels
    #[arg(long, default_value = "4")]
    text_padding: u32,

    /// Grayscale mask image with the same size as the input (white = protected)
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    for (name, pct) in [("width", cli.width_percent), ("height", cli.height_percent)] {
        if !(MIN_PERCENT..=MAX_PERCENT).contains(&pct) {
            eprintln!("Error: --{name}-percent must be between {MIN_PERCENT} and {MAX_PERCENT}");
            process::exit(1);
        }
    }

    if cli.width == Some(0) || cli.height == Some(0) {
        eprintln!("Error: --width and --height must be at least 1");
        process::exit(1);
    }

    let opts = ProcessOptions {
        width_percent: cli.width_percent,
        height_percent: cli.height_percent,
        target_width: cli.width,
        target_height: cli.height,
        order: if cli.height_first {
            CarveOrder::HeightFirst
        } else {
            CarveOrder::WidthFirst
        },
        protect: cli.protect,
        text_boxes: cli.text_box,
        text_proximity: cli.text_proximity,
        text_padding: cli.text_padding,
        mask_path: cli.mask,
        cancel: None,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        match (opts.target_width, opts.target_height) {
            (Some(w), Some(h)) => eprintln!("Target size: {w}x{h}"),
            _ => eprintln!(
                "Target size: {:.0}% x {:.0}%",
                opts.width_percent, opts.height_percent
            ),
        }
        if !opts.protect.is_empty() || !opts.text_boxes.is_empty() || opts.mask_path.is_some() {
            eprintln!(
                "Protecting {} region(s), {} text box(es){}",
                opts.protect.len(),
                opts.text_boxes.len(),
                if opts.mask_path.is_some() { " and a mask image" } else { "" }
            );
        }
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: content-resize <input_dir> -o <output_dir>");
            process::exit(1);
        };
        if opts.mask_path.is_some() {
            eprintln!("Error: --mask applies to a single image, not a directory");
            process::exit(1);
        }
        process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Resized: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            match result.output_size {
                Some((w, h)) => eprintln!("[OK] {filename} ({w}x{h})"),
                None => eprintln!("[OK] {filename}"),
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
