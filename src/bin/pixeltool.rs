use clap::{Parser, Subcommand};
use pixel_pipeline::tools::{binary_stats, grayscale_stats, load_rgba, save_rgba};
use pixel_pipeline::utils::binarization::{
    otsu_threshold_histogram, otsu_threshold_naive, otsu_threshold_optimized,
};
use pixel_pipeline::{Backend, OtsuMethod, Processor, ProcessorConfig, Step};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pixeltool", version, about = "Pixel pipeline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a comma separated chain of steps and save the result
    Apply {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// e.g. "bgr,gray,otsu" or "subtract:4,avg-pool:8"
        #[arg(long)]
        steps: String,
        /// cpu or parallel; defaults to PIXEL_BACKEND
        #[arg(long)]
        backend: Option<String>,
    },
    /// Print the Otsu threshold found by every search variant
    Threshold {
        #[arg(long)]
        image: PathBuf,
    },
    /// Print luma and binarization statistics
    Stats {
        #[arg(long)]
        image: PathBuf,
        /// Fixed threshold; Otsu when omitted
        #[arg(long)]
        threshold: Option<u8>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Apply {
            input,
            output,
            steps,
            backend,
        } => apply_cmd(&input, &output, &steps, backend.as_deref()),
        Command::Threshold { image } => threshold_cmd(&image),
        Command::Stats { image, threshold } => stats_cmd(&image, threshold),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn apply_cmd(
    input: &Path,
    output: &Path,
    steps: &str,
    backend: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let steps = Step::parse_list(steps)?;
    let config = match backend {
        Some(name) => ProcessorConfig {
            backend: name.parse::<Backend>()?,
        },
        None => ProcessorConfig::from_env(),
    };

    let buffer = load_rgba(input)?;
    println!(
        "Image: {} ({}x{})",
        input.display(),
        buffer.width(),
        buffer.height()
    );

    let start = Instant::now();
    let mut processor = Processor::with_config(buffer, config);
    processor.run(&steps)?;
    let elapsed = start.elapsed();

    let names: Vec<String> = steps.iter().map(Step::to_string).collect();
    println!(
        "Applied [{}] with {:?} backend in {:.2} ms",
        names.join(", "),
        config.backend,
        elapsed.as_secs_f64() * 1000.0
    );
    if let Some(t) = processor.last_threshold() {
        println!("Otsu threshold: {t}");
    }

    save_rgba(processor.buffer(), output)?;
    println!("Saved: {}", output.display());
    Ok(())
}

fn threshold_cmd(image: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut buffer = load_rgba(image)?;
    pixel_pipeline::utils::grayscale::grayscale(&mut buffer);
    let luma = buffer.luma_values();
    println!("Image: {} ({} pixels)", image.display(), luma.len());

    let variants: [(&str, fn(&[u8]) -> pixel_pipeline::OtsuResult); 3] = [
        ("naive", otsu_threshold_naive),
        ("optimized", otsu_threshold_optimized),
        ("histogram", otsu_threshold_histogram),
    ];
    for (name, search) in variants {
        let start = Instant::now();
        let result = search(&luma);
        println!(
            "  {:<10} t={:<3} sb2={:.4} time={:.3} ms",
            name,
            result.threshold,
            result.variance,
            start.elapsed().as_secs_f64() * 1000.0
        );
    }
    Ok(())
}

fn stats_cmd(image: &Path, threshold: Option<u8>) -> Result<(), Box<dyn std::error::Error>> {
    let buffer = load_rgba(image)?;
    println!(
        "Image: {} ({}x{})",
        image.display(),
        buffer.width(),
        buffer.height()
    );

    let gray = grayscale_stats(&buffer);
    println!(
        "Luma range: {}-{}, average: {}",
        gray.min, gray.max, gray.avg
    );

    let threshold = match threshold {
        Some(t) => t,
        None => pixel_pipeline::otsu_threshold(
            &buffer.to_flat_bytes(),
            buffer.width(),
            buffer.height(),
            OtsuMethod::Optimized,
        )?,
    };
    let stats = binary_stats(&buffer, threshold);
    println!(
        "Binary @{}: black_pixels={} total={} black_ratio={:.2}%",
        threshold,
        stats.black_pixels,
        stats.total_pixels,
        stats.black_ratio * 100.0
    );
    Ok(())
}
