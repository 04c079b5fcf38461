use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use svd_image_compress::cache::{CacheKey, CompressionCache};
use svd_image_compress::config::{CompressConfig, DEFAULT_K, OutputPlanner};
use svd_image_compress::{
    CompressError, CompressResult, CompressionResult, HasRecoverySuggestion, JpegQualityEncoder,
    RankTarget, compress_with,
};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Lossy image compression by truncated SVD:
/// - keeps the top k singular values of each RGB channel
/// - re-encodes as JPEG, searching the quality until the file is smaller than the original
#[derive(Parser, Debug)]
#[command(name = "svdc")]
#[command(about = "Compress PNG/JPEG images with rank-k SVD truncation")]
#[command(long_about = "Compress PNG/JPEG images with rank-k SVD truncation.
Each color channel keeps its k largest singular values; the reconstruction is
re-encoded as JPEG at the highest tried quality that makes it smaller than the input.")]
struct Args {
    /// Input images
    #[arg(required = true, help = "PNG or JPEG files to compress")]
    inputs: Vec<PathBuf>,

    /// Singular values to keep per channel
    #[arg(short = 'k', long = "rank", conflicts_with = "rate", allow_negative_numbers = true,
          help = "Singular values to keep per channel (clamped to 1..=min(height, width)) [default: 100]")]
    rank: Option<i64>,

    /// Compression rate in percent
    #[arg(short, long,
          help = "Compression rate 0-100 instead of k: k = max(5, round(200 * (100 - rate) / 100))")]
    rate: Option<u8>,

    /// Output directory
    #[arg(short, long, default_value = ".", help = "Directory for compressed files")]
    out_dir: PathBuf,

    /// Print JSON reports
    #[arg(long, help = "Print one JSON report per image instead of a summary")]
    json: bool,

    /// Debug logging
    #[arg(short, long, help = "Log every encoder search attempt")]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let rank = rank_target(&args);
    let config = CompressConfig::new(args.inputs, args.out_dir, rank, args.json);
    config.validate().inspect_err(log_hint)?;

    let mut cache = CompressionCache::new();
    let mut outputs = OutputPlanner::new();
    for input in &config.inputs {
        compress_one(&config, &mut cache, &mut outputs, input)
            .inspect_err(|err| {
                if let Some(err) = err.downcast_ref::<CompressError>() {
                    log_hint(err);
                }
            })
            .with_context(|| format!("failed to compress {}", input.display()))?;
    }

    if cache.hits() > 0 {
        info!(hits = cache.hits(), "served duplicate inputs from cache");
    }
    Ok(())
}

fn rank_target(args: &Args) -> RankTarget {
    match (args.rank, args.rate) {
        (_, Some(rate)) => RankTarget::CompressionRate(rate),
        (Some(k), None) => RankTarget::Exact(k),
        (None, None) => RankTarget::Exact(DEFAULT_K),
    }
}

fn log_hint(err: &CompressError) {
    if let Some(hint) = err.recovery_suggestion() {
        warn!("hint: {}", hint);
    }
}

/// Install the fmt subscriber; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn compress_one(
    config: &CompressConfig,
    cache: &mut CompressionCache,
    outputs: &mut OutputPlanner,
    input: &Path,
) -> Result<()> {
    let bytes = std::fs::read(input).context("reading input")?;
    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let k = config.requested_k();
    let (result, cached) = cache.get_or_compress(CacheKey::new(&bytes, k), || {
        compress_with(&JpegQualityEncoder, &bytes, &extension, k, &config.search)
    })?;

    let planned = outputs.claim(config, input, result.k);
    if planned.renamed {
        warn!(
            "{} would overwrite another input's output, writing {} instead",
            input.display(),
            planned.path.display()
        );
    }
    let output = planned.path;
    write_atomically(&config.out_dir, &output, &result.output_bytes)?;

    if !result.size_reduced() {
        warn!(
            before = result.before_size,
            after = result.after_size,
            "{} could not be made smaller than the original",
            input.display()
        );
    }

    if config.json {
        println!("{}", result.to_report().to_json()?);
    } else {
        print_summary(input, &output, &result, cached);
    }
    Ok(())
}

/// Write through a temp file in the target directory so readers never see a partial file.
fn write_atomically(dir: &Path, output: &Path, bytes: &[u8]) -> CompressResult<()> {
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| CompressError::io_at("create temp file", dir.display().to_string(), e))?;
    tmp.write_all(bytes)?;
    tmp.persist(output)
        .map_err(|e| CompressError::io_at("write output", output.display().to_string(), e.error))?;
    Ok(())
}

fn print_summary(input: &Path, output: &Path, result: &CompressionResult, cached: bool) {
    println!("{} → {}{}", input.display(), output.display(), if cached { " (cached)" } else { "" });
    println!(
        "  k: {}, quality: {}, dimension: {}, runtime: {:.3}s",
        result.k,
        result.quality,
        result.dimension_label(),
        result.runtime_seconds()
    );
    println!(
        "  size: {:.2} KB → {:.2} KB ({})",
        result.before_kb(),
        result.after_kb(),
        result.ratio_label()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_defaults_to_100() {
        let args = Args::try_parse_from(["svdc", "a.png"]).unwrap();
        assert_eq!(rank_target(&args), RankTarget::Exact(100));
        assert_eq!(args.out_dir, PathBuf::from("."));
        assert!(!args.json);
    }

    #[test]
    fn explicit_rank_and_rate() {
        let args = Args::try_parse_from(["svdc", "-k", "-3", "a.png", "b.jpg"]).unwrap();
        assert_eq!(rank_target(&args), RankTarget::Exact(-3));
        assert_eq!(args.inputs.len(), 2);

        let args = Args::try_parse_from(["svdc", "--rate", "75", "a.png"]).unwrap();
        assert_eq!(rank_target(&args), RankTarget::CompressionRate(75));
    }

    #[test]
    fn rank_and_rate_conflict() {
        assert!(Args::try_parse_from(["svdc", "-k", "5", "-r", "50", "a.png"]).is_err());
        assert!(Args::try_parse_from(["svdc"]).is_err());
    }

    #[test]
    fn negative_rank_reaches_the_clamp() {
        let args = Args::try_parse_from(["svdc", "--rank", "-1", "a.png"]).unwrap();
        assert_eq!(rank_target(&args), RankTarget::Exact(-1));
        let args = Args::try_parse_from(["svdc", "-k", "0", "a.png"]).unwrap();
        assert_eq!(rank_target(&args), RankTarget::Exact(0));
    }

    #[test]
    fn writes_output_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("svd_x_k1.jpg");
        write_atomically(dir.path(), &target, b"jpeg").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"jpeg");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let missing = dir.path().join("missing");
        let err = write_atomically(&missing, &missing.join("x.jpg"), b"jpeg").unwrap_err();
        assert_eq!(err.category(), "io");
    }
}
