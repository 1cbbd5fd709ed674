//! CLI for nb-studio - Gemini image studio.

use clap::{Args, Parser, Subcommand, ValueEnum};
use nb_studio::image::GeneratedImage;
use nb_studio::progress::{CreativeMode, PhaseSequence, ProgressEstimator, ProgressSnapshot};
use nb_studio::prompt::{presets_in, search_presets, IconStyle, PresetCategory, PromptPreset};
use nb_studio::{
    EditRequest, FlipbookRequest, FreestyleRequest, GeminiProvider, IconRequest, Session, Studio,
    StudioConfig, Upload,
};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nb-studio")]
#[command(about = "Edit photos and generate images with Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// E-mail of the signed-in user
    #[arg(long, global = true, env = "STUDIO_USER")]
    user: Option<String>,

    /// Gemini image model (overrides GEMINI_IMAGE_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Hide the progress bar
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit one photo with a preset or a custom instruction
    Edit(EditArgs),

    /// Turn one photo into a four-frame flipbook
    Flipbook(FlipbookArgs),

    /// Blend up to five photos following free-form instructions
    Freestyle(FreestyleArgs),

    /// Generate an image from text only
    Prompt(PromptArgs),

    /// Create a contact icon
    Icon(IconArgs),

    /// List edit presets
    Presets(PresetsArgs),

    /// List icon styles
    Styles,

    /// Show the progress phases of a mode
    Phases {
        /// Creative mode
        #[arg(value_enum)]
        mode: ModeArg,
    },
}

#[derive(Args)]
struct EditArgs {
    /// Photo to edit
    image: PathBuf,

    /// Preset id (see `presets`)
    #[arg(long, conflicts_with = "prompt", required_unless_present = "prompt")]
    preset: Option<String>,

    /// Custom edit instruction
    #[arg(long)]
    prompt: Option<String>,

    /// Second photo for two-person presets
    #[arg(long)]
    second: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct FlipbookArgs {
    /// Story idea
    story: String,

    /// Reference photo
    image: PathBuf,

    /// Directory for the frames
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Args)]
struct FreestyleArgs {
    /// Edit instructions
    prompt: String,

    /// Reference photo (repeat up to five times)
    #[arg(short, long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct PromptArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct IconArgs {
    /// Contact name
    name: String,

    /// Web page describing the contact
    #[arg(long)]
    url: Option<String>,

    /// Icon style (see `styles`)
    #[arg(long, default_value = "auto")]
    style: String,

    /// Extra instructions
    #[arg(long)]
    custom: Option<String>,

    /// Reference photo (repeat up to three times)
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct PresetsArgs {
    /// Only show one category
    #[arg(long, value_enum)]
    category: Option<CategoryArg>,

    /// Filter by label, prompt or id
    #[arg(long)]
    search: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    Creative,
    Business,
    Fantasy,
}

impl From<CategoryArg> for PresetCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Creative => PresetCategory::Creative,
            CategoryArg::Business => PresetCategory::Business,
            CategoryArg::Fantasy => PresetCategory::Fantasy,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Edit,
    Flipbook,
    Freestyle,
    Prompt,
    Icon,
}

impl From<ModeArg> for CreativeMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Edit => CreativeMode::SingleEdit,
            ModeArg::Flipbook => CreativeMode::Flipbook,
            ModeArg::Freestyle => CreativeMode::Freestyle,
            ModeArg::Prompt => CreativeMode::PromptOnly,
            ModeArg::Icon => CreativeMode::Icon,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Presets(ref args) => return list_presets(args, cli.json),
        Commands::Styles => return list_styles(cli.json),
        Commands::Phases { mode } => return show_phases(mode.into(), cli.json),
        _ => {}
    }

    let mut config = StudioConfig::from_env();
    if let Some(model) = &cli.model {
        config = config.with_image_model(model);
    }
    let studio = Studio::new(config.gemini_provider()?, config.access.clone());
    let session = cli.user.as_deref().map(Session::verified);
    let ctx = RunContext {
        studio: &studio,
        session: session.as_ref(),
        json: cli.json,
        show_progress: !cli.quiet && !cli.json,
    };

    match cli.command {
        Commands::Edit(args) => edit(&ctx, args).await,
        Commands::Flipbook(args) => flipbook(&ctx, args).await,
        Commands::Freestyle(args) => freestyle(&ctx, args).await,
        Commands::Prompt(args) => prompt(&ctx, args).await,
        Commands::Icon(args) => icon(&ctx, args).await,
        Commands::Presets(_) | Commands::Styles | Commands::Phases { .. } => Ok(()),
    }
}

struct RunContext<'a> {
    studio: &'a Studio<GeminiProvider>,
    session: Option<&'a Session>,
    json: bool,
    show_progress: bool,
}

impl RunContext<'_> {
    /// Runs `work` with a progress bar on stderr.
    async fn tracked<F, T>(&self, mode: CreativeMode, work: F) -> nb_studio::Result<T>
    where
        F: Future<Output = nb_studio::Result<T>>,
    {
        let estimator = ProgressEstimator::new(|| {});
        let renderer = self
            .show_progress
            .then(|| tokio::spawn(render_progress(estimator.subscribe(), mode.phases())));

        let result = self.studio.run_tracked(&estimator, mode, work).await;

        if let Some(renderer) = renderer {
            join_renderer(renderer).await;
            eprintln!();
        }
        result
    }
}

/// Waits for the progress renderer; returns false if it panicked or was
/// cancelled.
async fn join_renderer(renderer: tokio::task::JoinHandle<()>) -> bool {
    match renderer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "progress renderer failed");
            false
        }
    }
}

async fn render_progress(mut updates: watch::Receiver<ProgressSnapshot>, phases: PhaseSequence) {
    const WIDTH: usize = 30;

    while updates.changed().await.is_ok() {
        let snapshot = *updates.borrow_and_update();
        let filled = (snapshot.percent / 100.0 * WIDTH as f64).round() as usize;
        let label = phases
            .get(snapshot.phase_index)
            .map(|p| p.label.as_str())
            .unwrap_or_default();

        eprint!(
            "\r[{}{}] {:>3}% {:<40}",
            "#".repeat(filled.min(WIDTH)),
            ".".repeat(WIDTH - filled.min(WIDTH)),
            snapshot.rounded_percent(),
            label
        );
        let _ = std::io::stderr().flush();

        if snapshot.state.is_terminal() {
            break;
        }
    }
}

async fn edit(ctx: &RunContext<'_>, args: EditArgs) -> anyhow::Result<()> {
    let image = Upload::from_path(&args.image)?;
    let mut request = match (&args.preset, args.prompt) {
        (Some(id), _) => EditRequest::from_preset_id(id, image)?,
        (None, Some(prompt)) => EditRequest::new(prompt, image),
        (None, None) => anyhow::bail!("either --preset or --prompt is required"),
    };
    if let Some(second) = &args.second {
        request = request.with_second_image(Upload::from_path(second)?);
    }

    let image = ctx
        .tracked(CreativeMode::SingleEdit, ctx.studio.edit(ctx.session, request))
        .await?;
    report(ctx, "edit", &[save(&image, &args.output)?])
}

async fn flipbook(ctx: &RunContext<'_>, args: FlipbookArgs) -> anyhow::Result<()> {
    let request = FlipbookRequest {
        story: args.story,
        image: Upload::from_path(&args.image)?,
    };

    let frames = ctx
        .tracked(CreativeMode::Flipbook, ctx.studio.flipbook(ctx.session, request))
        .await?;

    std::fs::create_dir_all(&args.output_dir)?;
    let saved = frames
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            let path = args
                .output_dir
                .join(format!("frame-{}.{}", index + 1, frame.format.extension()));
            save(frame, &path)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    report(ctx, "flipbook", &saved)
}

async fn freestyle(ctx: &RunContext<'_>, args: FreestyleArgs) -> anyhow::Result<()> {
    let request = FreestyleRequest {
        prompt: args.prompt,
        images: read_uploads(&args.images)?,
    };

    let image = ctx
        .tracked(CreativeMode::Freestyle, ctx.studio.freestyle(ctx.session, request))
        .await?;
    report(ctx, "freestyle", &[save(&image, &args.output)?])
}

async fn prompt(ctx: &RunContext<'_>, args: PromptArgs) -> anyhow::Result<()> {
    let image = ctx
        .tracked(
            CreativeMode::PromptOnly,
            ctx.studio.prompt_only(ctx.session, &args.prompt),
        )
        .await?;
    report(ctx, "prompt", &[save(&image, &args.output)?])
}

async fn icon(ctx: &RunContext<'_>, args: IconArgs) -> anyhow::Result<()> {
    let request = IconRequest {
        name: args.name,
        url: args.url,
        style: IconStyle::from_id(&args.style),
        custom_prompt: args.custom,
        images: read_uploads(&args.images)?,
    };

    let image = ctx
        .tracked(CreativeMode::Icon, ctx.studio.icon(ctx.session, request))
        .await?;
    report(ctx, "icon", &[save(&image, &args.output)?])
}

fn read_uploads(paths: &[PathBuf]) -> anyhow::Result<Vec<Upload>> {
    paths
        .iter()
        .map(|path| Upload::from_path(path).map_err(anyhow::Error::from))
        .collect()
}

struct Saved {
    path: PathBuf,
    size: usize,
    mime_type: &'static str,
    model: Option<String>,
    duration_ms: Option<u64>,
}

fn save(image: &GeneratedImage, path: &Path) -> anyhow::Result<Saved> {
    image.save(path)?;
    Ok(Saved {
        path: path.to_path_buf(),
        size: image.size(),
        mime_type: image.format.mime_type(),
        model: image.metadata.model.clone(),
        duration_ms: image.metadata.duration_ms,
    })
}

fn report(ctx: &RunContext<'_>, mode: &str, saved: &[Saved]) -> anyhow::Result<()> {
    if ctx.json {
        let images: Vec<_> = saved
            .iter()
            .map(|s| {
                serde_json::json!({
                    "output": s.path.display().to_string(),
                    "size_bytes": s.size,
                    "mime_type": s.mime_type,
                    "model": s.model,
                    "duration_ms": s.duration_ms,
                })
            })
            .collect();
        let result = serde_json::json!({
            "mode": mode,
            "success": true,
            "images": images,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for s in saved {
            println!("Saved {} ({} bytes, {})", s.path.display(), s.size, s.mime_type);
            if let Some(duration) = s.duration_ms {
                println!("  Duration: {}ms", duration);
            }
        }
    }
    Ok(())
}

fn list_presets(args: &PresetsArgs, json_output: bool) -> anyhow::Result<()> {
    let mut presets: Vec<&PromptPreset> = match &args.search {
        Some(query) => search_presets(query),
        None => nb_studio::prompt::presets().iter().collect(),
    };
    if let Some(category) = args.category {
        let category = PresetCategory::from(category);
        presets.retain(|p| p.category == category);
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }

    for category in PresetCategory::ALL {
        let in_category: Vec<_> = presets_in(category)
            .filter(|p| presets.iter().any(|q| q.id == p.id))
            .collect();
        if in_category.is_empty() {
            continue;
        }
        println!("{}:", category.as_str().to_uppercase());
        for preset in in_category {
            let marker = if preset.requires_second_image() { " (2 photos)" } else { "" };
            println!("  {} - {}{}", preset.id, preset.label, marker);
            println!("    {}", preset.preview());
        }
        println!();
    }
    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        let styles: Vec<_> = IconStyle::ALL
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id(),
                    "label": s.label(),
                    "description": s.description(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&styles)?);
    } else {
        for style in IconStyle::ALL {
            println!("  {:<16} {} - {}", style.id(), style.label(), style.description());
        }
    }
    Ok(())
}

fn show_phases(mode: CreativeMode, json_output: bool) -> anyhow::Result<()> {
    let phases = mode.phases();
    if json_output {
        println!("{}", serde_json::to_string_pretty(phases.phases())?);
        return Ok(());
    }

    println!("{} ({}ms total):", mode, phases.total_ms());
    for (index, phase) in phases.phases().iter().enumerate() {
        let marker = if index >= phases.final_window_start() { "*" } else { " " };
        println!("  {} {:<14} {:>6}ms  {}", marker, phase.id, phase.estimated_duration_ms, phase.label);
    }
    println!("\n  * final window");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_renderer_reports_panic() {
        let finished = tokio::spawn(async {});
        assert!(join_renderer(finished).await);

        let panicked = tokio::spawn(async { panic!("terminal gone") });
        assert!(!join_renderer(panicked).await);
    }
}
