// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Three subcommands:
//
//   stats    compute and save normalization statistics
//   inspect  count images per class and quality flag
//   show     print a saved statistics archive
//
// `stats` and `inspect` share the dataset location and the
// quality-filter flags through flattened argument groups.

use clap::{Args, Subcommand};

use crate::application::{inspect_use_case::InspectConfig, stats_use_case::StatsConfig};
use crate::data::dataset::MAX_IMAGE_SIZE;
use crate::domain::quality::QualityFilter;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute per-channel mean, std and scaling factor for photos and sketches
    Stats(StatsArgs),

    /// Explore the dataset: class balance and sketch quality flags
    Inspect(InspectArgs),

    /// Print the values stored in a statistics archive
    Show(ShowArgs),
}

/// Where the dataset lives
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset root containing the photo and sketch directories
    #[arg(long, default_value = "data")]
    pub data_root: String,

    /// Photo directory name under the root
    #[arg(long, default_value = "photo")]
    pub photo_dir: String,

    /// Sketch directory name under the root
    #[arg(long, default_value = "sketch")]
    pub sketch_dir: String,

    /// CSV with sketch quality flags (sketch,error,context,ambiguous,wrong_pose)
    #[arg(long)]
    pub quality_csv: Option<String>,
}

/// Which flagged sketches to keep. By default every flagged sketch is dropped.
#[derive(Args, Debug, Clone, Default)]
pub struct QualityArgs {
    /// Keep sketches flagged as erroneous
    #[arg(long)]
    pub keep_error: bool,

    /// Keep sketches flagged as containing context
    #[arg(long)]
    pub keep_context: bool,

    /// Keep sketches flagged as ambiguous
    #[arg(long)]
    pub keep_ambiguous: bool,

    /// Keep sketches flagged as drawn in the wrong pose
    #[arg(long)]
    pub keep_wrong_pose: bool,

    /// Disable quality filtering entirely
    #[arg(long)]
    pub no_quality_filter: bool,
}

impl From<&QualityArgs> for QualityFilter {
    fn from(a: &QualityArgs) -> Self {
        if a.no_quality_filter {
            return QualityFilter::keep_all();
        }
        QualityFilter {
            exclude_error:      !a.keep_error,
            exclude_context:    !a.keep_context,
            exclude_ambiguous:  !a.keep_ambiguous,
            exclude_wrong_pose: !a.keep_wrong_pose,
        }
    }
}

/// All arguments for the `stats` command
#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[command(flatten)]
    pub quality: QualityArgs,

    /// Output .npz archive
    #[arg(long, default_value = "dataset_stats.npz")]
    pub output: String,

    /// Images are resized to this square size before accumulation
    #[arg(
        long,
        default_value_t = 256,
        value_parser = clap::value_parser!(u32).range(1..=MAX_IMAGE_SIZE as i64)
    )]
    pub image_size: u32,

    /// Number of images per batch
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Decoding threads used by the data loader
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    /// Do not recompute photo stats; reuse them from the existing output archive
    #[arg(long)]
    pub skip_photo: bool,

    /// Do not recompute sketch stats; reuse them from the existing output archive
    #[arg(long)]
    pub skip_sketch: bool,

    /// Only use the first N images of each modality (quick runs)
    #[arg(long)]
    pub max_samples: Option<usize>,
}

impl From<StatsArgs> for StatsConfig {
    fn from(a: StatsArgs) -> Self {
        StatsConfig {
            quality_filter: QualityFilter::from(&a.quality),
            data_root:      a.dataset.data_root,
            photo_dir:      a.dataset.photo_dir,
            sketch_dir:     a.dataset.sketch_dir,
            quality_csv:    a.dataset.quality_csv,
            output:         a.output,
            image_size:     a.image_size,
            batch_size:     a.batch_size,
            num_workers:    a.num_workers,
            compute_photo:  !a.skip_photo,
            compute_sketch: !a.skip_sketch,
            max_samples:    a.max_samples,
        }
    }
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[command(flatten)]
    pub quality: QualityArgs,

    /// Write per-class counts to this CSV file
    #[arg(long)]
    pub summary_csv: Option<String>,
}

impl From<InspectArgs> for InspectConfig {
    fn from(a: InspectArgs) -> Self {
        InspectConfig {
            quality_filter: QualityFilter::from(&a.quality),
            data_root:      a.dataset.data_root,
            photo_dir:      a.dataset.photo_dir,
            sketch_dir:     a.dataset.sketch_dir,
            quality_csv:    a.dataset.quality_csv,
            summary_csv:    a.summary_csv,
        }
    }
}

/// All arguments for the `show` command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Statistics archive to read
    #[arg(long, default_value = "dataset_stats.npz")]
    pub stats: String,
}
